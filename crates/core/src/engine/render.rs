//! Compact one-line candidate summaries for prompts.

use crate::domain::candidate::{
    LongTermFundCandidate, LongTermStockCandidate, ShortTermFundCandidate,
    ShortTermStockCandidate,
};

const NA: &str = "N/A";

pub trait PromptLine {
    /// `rank` is 1-based.
    fn prompt_line(&self, rank: usize) -> String;
}

pub fn render_lines<C: PromptLine>(candidates: &[C]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| c.prompt_line(i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Signed money amount in 亿 / 万 units.
pub fn format_amount(amount: Option<f64>) -> String {
    let Some(amount) = amount else {
        return NA.to_string();
    };
    if amount.abs() >= 1e8 {
        format!("{:.2}亿", amount / 1e8)
    } else if amount.abs() >= 1e4 {
        format!("{:.1}万", amount / 1e4)
    } else {
        format!("{amount:.0}")
    }
}

pub fn format_market_cap(cap: Option<f64>) -> String {
    let Some(cap) = cap else {
        return NA.to_string();
    };
    if cap >= 1e12 {
        format!("{:.1}万亿", cap / 1e12)
    } else if cap >= 1e8 {
        format!("{:.1}亿", cap / 1e8)
    } else {
        format!("{:.1}万", cap / 1e4)
    }
}

fn fixed2(v: Option<f64>) -> String {
    v.map_or_else(|| NA.to_string(), |v| format!("{v:.2}"))
}

fn pct(v: Option<f64>) -> String {
    v.map_or_else(|| NA.to_string(), |v| format!("{v:.2}%"))
}

impl PromptLine for ShortTermStockCandidate {
    fn prompt_line(&self, rank: usize) -> String {
        format!(
            "{rank}. {} {} | price {} | change {} | main inflow {} | volume ratio {} | score {}",
            self.code,
            self.name,
            fixed2(Some(self.price)),
            pct(Some(self.change_pct)),
            format_amount(Some(self.main_net_inflow)),
            fixed2(self.volume_ratio),
            self.score
        )
    }
}

impl PromptLine for LongTermStockCandidate {
    fn prompt_line(&self, rank: usize) -> String {
        format!(
            "{rank}. {} {} | price {} | PE {} | PB {} | market cap {} | score {}",
            self.code,
            self.name,
            fixed2(self.price),
            fixed2(Some(self.pe)),
            fixed2(Some(self.pb)),
            format_market_cap(Some(self.market_cap)),
            self.score
        )
    }
}

impl PromptLine for ShortTermFundCandidate {
    fn prompt_line(&self, rank: usize) -> String {
        format!(
            "{rank}. {} {} | type {} | 1w {} | 1m {} | score {}",
            self.code,
            self.name,
            self.fund_type,
            pct(Some(self.return_1w)),
            pct(Some(self.return_1m)),
            self.score
        )
    }
}

impl PromptLine for LongTermFundCandidate {
    fn prompt_line(&self, rank: usize) -> String {
        format!(
            "{rank}. {} {} | type {} | 1y {} | 3y {} | score {}",
            self.code,
            self.name,
            self.fund_type,
            pct(Some(self.return_1y)),
            pct(Some(self.return_3y)),
            self.score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_use_chinese_units() {
        assert_eq!(format_amount(Some(1.5e9)), "15.00亿");
        assert_eq!(format_amount(Some(-2.5e8)), "-2.50亿");
        assert_eq!(format_amount(Some(35_000.0)), "3.5万");
        assert_eq!(format_amount(Some(812.0)), "812");
        assert_eq!(format_amount(None), "N/A");

        assert_eq!(format_market_cap(Some(2.1e12)), "2.1万亿");
        assert_eq!(format_market_cap(Some(3.4e10)), "340.0亿");
        assert_eq!(format_market_cap(Some(5e7)), "5000.0万");
    }

    #[test]
    fn stock_lines_are_numbered_and_mark_missing_values() {
        let stocks = vec![
            LongTermStockCandidate {
                code: "601398".to_string(),
                name: "工商银行".to_string(),
                price: None,
                market_cap: 2e12,
                pe: 5.5,
                pb: 0.6,
                turnover: 1e9,
                change_pct: None,
                change_60d: Some(12.0),
                score: 100.0,
            },
            LongTermStockCandidate {
                code: "000333".to_string(),
                name: "美的集团".to_string(),
                price: Some(62.3),
                market_cap: 4e11,
                pe: 13.0,
                pb: 3.0,
                turnover: 1e9,
                change_pct: None,
                change_60d: None,
                score: 75.5,
            },
        ];

        assert_eq!(
            render_lines(&stocks),
            "1. 601398 工商银行 | price N/A | PE 5.50 | PB 0.60 | market cap 2.0万亿 | score 100\n\
             2. 000333 美的集团 | price 62.30 | PE 13.00 | PB 3.00 | market cap 4000.0亿 | score 75.5"
        );
    }

    #[test]
    fn short_term_lines() {
        let stock = ShortTermStockCandidate {
            code: "600519".to_string(),
            name: "贵州茅台".to_string(),
            price: 1688.0,
            change_pct: 2.5,
            turnover: 5e9,
            market_cap: 2.1e12,
            pe: 28.0,
            volume_ratio: None,
            main_net_inflow: 9.1e8,
            main_net_inflow_pct: None,
            is_hot: true,
            score: 88.12,
        };
        assert_eq!(
            stock.prompt_line(3),
            "3. 600519 贵州茅台 | price 1688.00 | change 2.50% | main inflow 9.10亿 | volume ratio N/A | score 88.12"
        );

        let fund = ShortTermFundCandidate {
            code: "110011".to_string(),
            name: "易方达中小盘".to_string(),
            fund_type: "混合型-偏股".to_string(),
            nav: 5.12,
            daily_growth: None,
            return_1w: 1.5,
            return_1m: 4.0,
            return_3m: None,
            score: 70.0,
        };
        assert_eq!(
            fund.prompt_line(1),
            "1. 110011 易方达中小盘 | type 混合型-偏股 | 1w 1.50% | 1m 4.00% | score 70"
        );
    }
}
