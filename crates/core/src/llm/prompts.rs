//! Horizon prompt templates. Each carries the candidate pool, a two-part market
//! context and the JSON output contract that [`crate::domain::contract`] decodes.

/// Rendered inputs shared by both horizon templates.
#[derive(Debug, Clone)]
pub struct PromptInput {
    pub stock_count: usize,
    pub stock_lines: String,
    pub fund_count: usize,
    pub fund_lines: String,
    /// Market indices and northbound flow (short-term) or global macro (long-term).
    pub primary_context: String,
    /// Hot sectors (short-term) or industry leaders/laggards (long-term).
    pub secondary_context: String,
    pub report_date: String,
}

pub fn short_term_prompt(input: &PromptInput) -> String {
    let PromptInput {
        stock_count,
        stock_lines,
        fund_count,
        fund_lines,
        primary_context,
        secondary_context,
        report_date,
    } = input;

    [
        "You are a senior quantitative analyst focused on short-term trades with a 7-30 day horizon.".to_string(),
        "Work from the data, not sentiment. Momentum and capital flow drive the short term; every stock pick needs a stop loss; spread picks across sectors.".to_string(),
        String::new(),
        format!("## Stock candidates ({stock_count}, by composite score)"),
        stock_lines.clone(),
        String::new(),
        format!("## Fund candidates ({fund_count}, by composite score)"),
        fund_lines.clone(),
        String::new(),
        "## Market".to_string(),
        primary_context.clone(),
        String::new(),
        "## Hot sectors".to_string(),
        secondary_context.clone(),
        String::new(),
        "## Output".to_string(),
        "Select from the candidate pool only. Reply with one JSON object:".to_string(),
        "{".to_string(),
        "  \"short_term_stocks\": [{\"code\": \"\", \"name\": \"\", \"current_price\": 0.0, \"recommendation_score\": 0, \"target_price\": 0.0, \"stop_loss\": 0.0, \"expected_return\": \"8-15%\", \"holding_period\": \"7-14 days\", \"investment_logic\": \"\", \"key_catalysts\": [], \"risk_factors\": [], \"confidence\": \"high|medium|low\"}],".to_string(),
        "  \"short_term_funds\": [{\"code\": \"\", \"name\": \"\", \"current_nav\": 0.0, \"recommendation_score\": 0, \"expected_return\": \"\", \"holding_period\": \"\", \"investment_logic\": \"\", \"key_catalysts\": [], \"risk_factors\": [], \"fund_type\": \"\", \"confidence\": \"high|medium|low\"}],".to_string(),
        "  \"market_view\": \"\",".to_string(),
        "  \"sector_preference\": [],".to_string(),
        "  \"risk_warning\": \"\",".to_string(),
        format!("  \"generated_at\": \"{report_date}\""),
        "}".to_string(),
        String::new(),
        "Rules: 5-8 stocks and 3-5 funds; recommendation_score >= 70; stop loss at support or -5% to -8%; prefer near-term catalysts, sustained inflow and rising sector heat.".to_string(),
        "Output JSON only.".to_string(),
    ]
    .join("\n")
}

pub fn long_term_prompt(input: &PromptInput) -> String {
    let PromptInput {
        stock_count,
        stock_lines,
        fund_count,
        fund_lines,
        primary_context,
        secondary_context,
        report_date,
    } = input;

    [
        "You are a senior value-investing researcher looking for opportunities held three months or longer.".to_string(),
        "Fundamentals first: profitability, growth and valuation. Follow industry trends, insist on a margin of safety and favour sector leaders.".to_string(),
        String::new(),
        format!("## Stock candidates ({stock_count}, by composite score)"),
        stock_lines.clone(),
        String::new(),
        format!("## Fund candidates ({fund_count}, by composite score)"),
        fund_lines.clone(),
        String::new(),
        "## Macro".to_string(),
        primary_context.clone(),
        String::new(),
        "## Industry outlook".to_string(),
        secondary_context.clone(),
        String::new(),
        "## Output".to_string(),
        "Select from the candidate pool only. Reply with one JSON object:".to_string(),
        "{".to_string(),
        "  \"long_term_stocks\": [{\"code\": \"\", \"name\": \"\", \"current_price\": 0.0, \"recommendation_score\": 0, \"target_price_1y\": 0.0, \"expected_return_1y\": \"20-40%\", \"investment_logic\": \"\", \"competitive_advantage\": \"\", \"growth_drivers\": [], \"risk_factors\": [], \"valuation_analysis\": {\"pe_ttm\": 0.0, \"pb\": 0.0, \"valuation_status\": \"undervalued|fair|rich\"}, \"industry_position\": \"\", \"confidence\": \"high|medium|low\"}],".to_string(),
        "  \"long_term_funds\": [{\"code\": \"\", \"name\": \"\", \"current_nav\": 0.0, \"recommendation_score\": 0, \"expected_return_1y\": \"\", \"investment_logic\": \"\", \"fund_style\": \"growth|value|balanced\", \"performance_analysis\": {\"return_1y\": \"\", \"return_3y\": \"\", \"consistency\": \"\"}, \"risk_factors\": [], \"suitable_for\": \"\", \"confidence\": \"high|medium|low\"}],".to_string(),
        "  \"macro_view\": \"\",".to_string(),
        "  \"sector_preference\": [],".to_string(),
        "  \"investment_theme\": [],".to_string(),
        "  \"risk_warning\": \"\",".to_string(),
        format!("  \"generated_at\": \"{report_date}\""),
        "}".to_string(),
        String::new(),
        "Rules: 5-8 stocks and 3-5 funds; recommendation_score >= 75; prefer leaders with valuations in the lower part of their historical range and a clear earnings growth path.".to_string(),
        "Output JSON only.".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> PromptInput {
        PromptInput {
            stock_count: 1,
            stock_lines: "1. 600519 贵州茅台 | price 1688.00".to_string(),
            fund_count: 0,
            fund_lines: String::new(),
            primary_context: "上证指数: 0.52%".to_string(),
            secondary_context: "半导体(3.1%)".to_string(),
            report_date: "2026-03-02 10:30".to_string(),
        }
    }

    #[test]
    fn short_term_prompt_embeds_inputs_and_contract() {
        let p = short_term_prompt(&input());
        assert!(p.contains("## Stock candidates (1, by composite score)"));
        assert!(p.contains("600519 贵州茅台"));
        assert!(p.contains("上证指数: 0.52%"));
        assert!(p.contains("\"short_term_stocks\""));
        assert!(p.contains("\"market_view\""));
        assert!(p.contains("\"generated_at\": \"2026-03-02 10:30\""));
    }

    #[test]
    fn long_term_prompt_uses_long_term_keys() {
        let p = long_term_prompt(&input());
        assert!(p.contains("\"long_term_funds\""));
        assert!(p.contains("\"macro_view\""));
        assert!(!p.contains("short_term_stocks"));
        assert!(p.contains("半导体(3.1%)"));
    }
}
