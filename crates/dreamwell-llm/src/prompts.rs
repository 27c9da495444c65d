//! Prompt builders. Keeping these in one place keeps phrasing consistent
//! across the keyword, extraction, and judgment calls.

/// Prompt for extracting influencer-search keywords from website content.
pub(crate) fn keyword_generation(url: &str, page_text: &str, top_n: usize) -> String {
    format!(
        "You are an assistant for an influencer marketing platform. Analyze a company's \
         website and extract the keywords that would help find the right YouTube \
         influencers for sponsorship opportunities.\n\n\
         Website URL: {url}\n\
         Website content: {page_text}\n\n\
         Extract {top_n} keywords that best describe what the company does, its \
         products, its target audience, and its niche. Include both single words and \
         two-word phrases, favor terms influencers use in their content, and avoid \
         generic terms like \"company\" or \"website\".\n\n\
         Return ONLY a comma-separated list of keywords, no explanations or formatting."
    )
}

/// Prompt for extracting product details from a page.
pub(crate) fn product_extraction(url: &str, html: &str) -> String {
    format!(
        "You are extracting product details from a webpage for influencer targeting.\n\
         URL: {url}\n\
         Page HTML (truncated):\n```\n{html}\n```\n\n\
         Extract:\n\
         - name: concise product name\n\
         - category: short category tag (e.g. \"fitness apparel\", \"tech gadget\")\n\
         - keywords: 2-3 concise search keywords for finding YouTube influencers who \
         would be a good fit; do not include the product name\n\
         - estimated_profit: estimated profit per unit in USD if the page gives enough \
         signal, else null\n\n\
         Respond in JSON with keys: name, category, keywords (array of strings), \
         estimated_profit (number or null)."
    )
}

/// Prompt for judging values alignment and cultural fit between a company and
/// a channel.
pub(crate) fn brand_fit(
    company_keywords: &[String],
    company_country: Option<&str>,
    channel_title: &str,
    channel_description: &str,
    channel_country: Option<&str>,
) -> String {
    format!(
        "You are scoring how well a YouTube channel fits a company for sponsorship.\n\n\
         Company values/keywords: {keywords}\n\
         Company market: {company_country}\n\
         Channel: {channel_title}\n\
         Channel description: {channel_description}\n\
         Channel country: {channel_country}\n\n\
         Score two axes from 0 to 100:\n\
         - values_alignment: how strongly the channel's themes match the company's \
         values and keywords\n\
         - cultural_fit: how compatible the channel's market and audience culture is \
         with the company's market\n\n\
         Respond in JSON with keys: values_alignment (number), cultural_fit (number), \
         values_reasoning (one sentence), cultural_reasoning (one sentence).",
        keywords = company_keywords.join(", "),
        company_country = company_country.unwrap_or("unknown"),
        channel_country = channel_country.unwrap_or("unknown"),
    )
}
