//! Custom-analysis prompt composition.

/// Standard influencer-content analysis prompt, used when the caller does not
/// supply one. Extended with the product name when a product is in scope.
#[must_use]
pub fn influencer_analysis(influencer_name: &str, product_name: Option<&str>) -> String {
    let mut prompt = format!(
        "Analyze this video content from {influencer_name} for influencer marketing \
         potential. Focus on:\n\n\
         1. Content quality and engagement: production quality (lighting, audio, \
         editing), engagement indicators, authenticity and relatability.\n\
         2. Brand fit: how the content style would fit various brand types, audience \
         demographics and interests, content themes and values alignment.\n\
         3. Collaboration potential: natural integration points for product placements, \
         sponsored-content opportunities, audience trust and credibility.\n\
         4. Performance indicators: visual appeal, storytelling and narrative \
         structure, call-to-action effectiveness.\n\
         5. Audience insights: target demographic characteristics, engagement patterns, \
         community interaction quality.\n\n\
         Provide specific timestamps and examples where relevant. Rate the overall \
         influencer potential on a scale of 1-10 and explain your reasoning."
    );

    if let Some(product) = product_name {
        prompt.push_str(&format!(
            "\n\nSpecifically consider how this content would work for promoting: {product}"
        ));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_the_influencer() {
        let prompt = influencer_analysis("Fit With Ana", None);
        assert!(prompt.contains("Fit With Ana"));
        assert!(!prompt.contains("promoting:"));
    }

    #[test]
    fn prompt_appends_product_context() {
        let prompt = influencer_analysis("Fit With Ana", Some("Iron Kettlebell"));
        assert!(prompt.ends_with("promoting: Iron Kettlebell"));
    }
}
