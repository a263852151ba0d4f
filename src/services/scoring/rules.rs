//! Additive scoring rules.
//!
//! Each rule looks at the latest close and the indicator vector and either
//! stays silent or awards points to one side with a reason. [`RULES`] is the
//! evaluation order, which is also the order reasons appear in.

use super::ScoringConfig;
use crate::types::IndicatorVector;

const TREND_STACK_POINTS: i32 = 15;
const MA20_POINTS: i32 = 5;
const MA50_POINTS: i32 = 10;
const MA200_POINTS: i32 = 15;
const RSI_EXTREME_POINTS: i32 = 20;
const RSI_LEAN_POINTS: i32 = 5;
const MACD_CROSS_POINTS: i32 = 15;
const MACD_HIST_POINTS: i32 = 5;
const BAND_EDGE_POINTS: i32 = 15;
const BAND_MIDDLE_POINTS: i32 = 3;

/// Side a rule votes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Points awarded by one triggered rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub side: Side,
    pub points: i32,
    pub reason: String,
}

impl RuleHit {
    fn buy(points: i32, reason: String) -> Self {
        Self {
            side: Side::Buy,
            points,
            reason,
        }
    }

    fn sell(points: i32, reason: String) -> Self {
        Self {
            side: Side::Sell,
            points,
            reason,
        }
    }
}

/// Inputs every rule sees.
pub struct RuleContext<'a> {
    pub price: f64,
    pub indicators: &'a IndicatorVector,
    pub config: &'a ScoringConfig,
}

/// A named scoring rule.
pub struct Rule {
    pub name: &'static str,
    pub evaluate: fn(&RuleContext<'_>) -> Option<RuleHit>,
}

/// All rules in evaluation order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "trend_stack",
        evaluate: trend_stack,
    },
    Rule {
        name: "price_vs_ma20",
        evaluate: price_vs_ma20,
    },
    Rule {
        name: "price_vs_ma50",
        evaluate: price_vs_ma50,
    },
    Rule {
        name: "price_vs_ma200",
        evaluate: price_vs_ma200,
    },
    Rule {
        name: "rsi_zone",
        evaluate: rsi_zone,
    },
    Rule {
        name: "macd_cross",
        evaluate: macd_cross,
    },
    Rule {
        name: "macd_histogram",
        evaluate: macd_histogram,
    },
    Rule {
        name: "bollinger_position",
        evaluate: bollinger_position,
    },
];

/// Accumulated buy/sell points and reasons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    pub buy: i32,
    pub sell: i32,
    pub reasons: Vec<String>,
}

impl Tally {
    fn add(mut self, hit: RuleHit) -> Self {
        match hit.side {
            Side::Buy => self.buy += hit.points,
            Side::Sell => self.sell += hit.points,
        }
        self.reasons.push(hit.reason);
        self
    }

    /// Buy points minus sell points.
    pub fn total(&self) -> i32 {
        self.buy - self.sell
    }
}

/// Fold every rule over the context.
pub fn tally(ctx: &RuleContext<'_>) -> Tally {
    RULES
        .iter()
        .filter_map(|rule| (rule.evaluate)(ctx))
        .fold(Tally::default(), Tally::add)
}

fn trend_stack(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let ind = ctx.indicators;
    let (ma5, ma10, ma20) = (ind.ma5?, ind.ma10?, ind.ma20?);

    if ma5 > ma10 && ma10 > ma20 {
        Some(RuleHit::buy(
            TREND_STACK_POINTS,
            "Bullish MA alignment: MA5 > MA10 > MA20".to_string(),
        ))
    } else if ma5 < ma10 && ma10 < ma20 {
        Some(RuleHit::sell(
            TREND_STACK_POINTS,
            "Bearish MA alignment: MA5 < MA10 < MA20".to_string(),
        ))
    } else {
        None
    }
}

fn price_vs_average(price: f64, average: f64, label: &str, points: i32) -> RuleHit {
    if price > average {
        RuleHit::buy(
            points,
            format!("Price above {} ({:.2} > {:.2})", label, price, average),
        )
    } else {
        RuleHit::sell(
            points,
            format!("Price below {} ({:.2} <= {:.2})", label, price, average),
        )
    }
}

fn price_vs_ma20(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let ma20 = ctx.indicators.ma20?;
    Some(price_vs_average(ctx.price, ma20, "MA20", MA20_POINTS))
}

fn price_vs_ma50(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let ma50 = ctx.indicators.ma50?;
    Some(price_vs_average(ctx.price, ma50, "MA50", MA50_POINTS))
}

fn price_vs_ma200(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let ma200 = ctx.indicators.ma200?;
    Some(price_vs_average(ctx.price, ma200, "MA200", MA200_POINTS))
}

fn rsi_zone(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let rsi = ctx.indicators.scored_rsi()?;
    let cfg = ctx.config;

    if rsi < cfg.rsi_oversold {
        Some(RuleHit::buy(
            RSI_EXTREME_POINTS,
            format!("RSI oversold ({:.2} < {})", rsi, cfg.rsi_oversold),
        ))
    } else if rsi > cfg.rsi_overbought {
        Some(RuleHit::sell(
            RSI_EXTREME_POINTS,
            format!("RSI overbought ({:.2} > {})", rsi, cfg.rsi_overbought),
        ))
    } else if rsi <= cfg.rsi_midline {
        Some(RuleHit::buy(
            RSI_LEAN_POINTS,
            format!("RSI leaning low ({:.2})", rsi),
        ))
    } else if rsi <= cfg.rsi_overbought {
        Some(RuleHit::sell(
            RSI_LEAN_POINTS,
            format!("RSI leaning high ({:.2})", rsi),
        ))
    } else {
        // NaN
        None
    }
}

fn macd_cross(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let (macd, signal) = (ctx.indicators.macd?, ctx.indicators.macd_signal?);

    if macd > signal {
        Some(RuleHit::buy(
            MACD_CROSS_POINTS,
            format!("MACD bullish (MACD={:.4} > Signal={:.4})", macd, signal),
        ))
    } else {
        Some(RuleHit::sell(
            MACD_CROSS_POINTS,
            format!("MACD bearish (MACD={:.4} <= Signal={:.4})", macd, signal),
        ))
    }
}

fn macd_histogram(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let hist = ctx.indicators.macd_hist?;

    if hist > 0.0 {
        Some(RuleHit::buy(
            MACD_HIST_POINTS,
            format!("MACD histogram positive ({:.4})", hist),
        ))
    } else {
        Some(RuleHit::sell(
            MACD_HIST_POINTS,
            format!("MACD histogram non-positive ({:.4})", hist),
        ))
    }
}

fn bollinger_position(ctx: &RuleContext<'_>) -> Option<RuleHit> {
    let (upper, middle, lower) = ctx.indicators.bands()?;
    let price = ctx.price;
    let tol = ctx.config.band_tolerance;

    if price <= lower * (1.0 + tol) {
        Some(RuleHit::buy(
            BAND_EDGE_POINTS,
            format!("Price near lower Bollinger band ({:.2} vs {:.2})", price, lower),
        ))
    } else if price >= upper * (1.0 - tol) {
        Some(RuleHit::sell(
            BAND_EDGE_POINTS,
            format!("Price near upper Bollinger band ({:.2} vs {:.2})", price, upper),
        ))
    } else if middle * (1.0 - tol) <= price && price <= middle * (1.0 + tol) {
        Some(RuleHit::buy(
            BAND_MIDDLE_POINTS,
            format!("Price near middle Bollinger band ({:.2} vs {:.2})", price, middle),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn vector() -> IndicatorVector {
        IndicatorVector::new("QQQ", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
    }

    fn eval(
        rule: fn(&RuleContext<'_>) -> Option<RuleHit>,
        price: f64,
        ind: &IndicatorVector,
    ) -> Option<RuleHit> {
        let config = ScoringConfig::default();
        rule(&RuleContext {
            price,
            indicators: ind,
            config: &config,
        })
    }

    #[test]
    fn test_trend_stack() {
        let mut ind = vector();
        assert!(eval(trend_stack, 100.0, &ind).is_none());

        (ind.ma5, ind.ma10, ind.ma20) = (Some(3.0), Some(2.0), Some(1.0));
        let hit = eval(trend_stack, 100.0, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Buy, 15));

        (ind.ma5, ind.ma10, ind.ma20) = (Some(1.0), Some(2.0), Some(3.0));
        let hit = eval(trend_stack, 100.0, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Sell, 15));

        (ind.ma5, ind.ma10, ind.ma20) = (Some(2.0), Some(3.0), Some(1.0));
        assert!(eval(trend_stack, 100.0, &ind).is_none());
    }

    #[test]
    fn test_price_on_average_counts_as_below() {
        let mut ind = vector();
        ind.ma50 = Some(100.0);
        let hit = eval(price_vs_ma50, 100.0, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Sell, 10));
        assert_eq!(hit.reason, "Price below MA50 (100.00 <= 100.00)");
    }

    #[test]
    fn test_rsi_zones() {
        let mut ind = vector();
        let cases = [
            (25.0, Side::Buy, 20),
            (30.0, Side::Buy, 5),
            (50.0, Side::Buy, 5),
            (50.5, Side::Sell, 5),
            (70.0, Side::Sell, 5),
            (70.1, Side::Sell, 20),
        ];
        for (rsi, side, points) in cases {
            ind.rsi14 = Some(rsi);
            let hit = eval(rsi_zone, 100.0, &ind).unwrap();
            assert_eq!((hit.side, hit.points), (side, points), "rsi {}", rsi);
        }

        ind.rsi14 = Some(f64::NAN);
        assert!(eval(rsi_zone, 100.0, &ind).is_none());

        ind.rsi14 = Some(0.0);
        assert!(eval(rsi_zone, 100.0, &ind).is_none());
    }

    #[test]
    fn test_macd_rules_need_both_lines() {
        let mut ind = vector();
        ind.macd = Some(1.0);
        assert!(eval(macd_cross, 100.0, &ind).is_none());

        ind.macd_signal = Some(1.0);
        let hit = eval(macd_cross, 100.0, &ind).unwrap();
        assert_eq!(hit.side, Side::Sell);

        ind.macd_hist = Some(0.0);
        let hit = eval(macd_histogram, 100.0, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Sell, 5));
    }

    #[test]
    fn test_bollinger_priority() {
        let mut ind = vector();
        (ind.bb_upper, ind.bb_mid, ind.bb_lower) = (Some(110.0), Some(100.0), Some(90.0));

        let hit = eval(bollinger_position, 91.5, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Buy, 15));

        let hit = eval(bollinger_position, 108.0, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Sell, 15));

        let hit = eval(bollinger_position, 101.5, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Buy, 3));

        assert!(eval(bollinger_position, 104.0, &ind).is_none());
    }

    #[test]
    fn test_bollinger_lower_wins_when_bands_overlap() {
        // Collapsed bands: every branch matches, the lower-band check runs first.
        let mut ind = vector();
        (ind.bb_upper, ind.bb_mid, ind.bb_lower) = (Some(100.0), Some(100.0), Some(100.0));
        let hit = eval(bollinger_position, 100.0, &ind).unwrap();
        assert_eq!((hit.side, hit.points), (Side::Buy, 15));
    }

    #[test]
    fn test_tally_preserves_rule_order() {
        let mut ind = vector();
        ind.ma20 = Some(90.0);
        ind.rsi14 = Some(80.0);
        ind.macd_hist = Some(0.5);

        let config = ScoringConfig::default();
        let result = tally(&RuleContext {
            price: 100.0,
            indicators: &ind,
            config: &config,
        });

        assert_eq!(result.buy, 10);
        assert_eq!(result.sell, 20);
        assert_eq!(result.total(), -10);
        assert_eq!(result.reasons.len(), 3);
        assert!(result.reasons[0].starts_with("Price above MA20"));
        assert!(result.reasons[1].starts_with("RSI overbought"));
        assert!(result.reasons[2].starts_with("MACD histogram positive"));
    }

    #[test]
    fn test_rule_names_unique() {
        let mut names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }
}
