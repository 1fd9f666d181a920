//! Price / probability transforms.

use crate::domain::{PriceConvention, PriceQuote};

/// Implied probability of a single price.
///
/// American: `+x` pays x per 100 staked, `-x` lays x to win 100.
/// Decimal: total return per unit staked, must exceed 1.0.
/// Returns `None` for prices that do not describe a bet.
pub fn odds_to_probability(price: f64, convention: PriceConvention) -> Option<f64> {
    if !price.is_finite() {
        return None;
    }
    match convention {
        PriceConvention::American => {
            if price > 0.0 {
                Some(100.0 / (price + 100.0))
            } else if price < 0.0 {
                Some(price.abs() / (price.abs() + 100.0))
            } else {
                None
            }
        }
        PriceConvention::Decimal => {
            if price > 1.0 {
                Some(1.0 / price)
            } else {
                None
            }
        }
    }
}

/// Fair price for a probability in (0, 1)
pub fn probability_to_odds(probability: f64, convention: PriceConvention) -> Option<f64> {
    if !(probability > 0.0 && probability < 1.0) {
        return None;
    }
    match convention {
        PriceConvention::American => {
            if probability >= 0.5 {
                Some(-100.0 * probability / (1.0 - probability))
            } else {
                Some(100.0 * (1.0 - probability) / probability)
            }
        }
        PriceConvention::Decimal => Some(1.0 / probability),
    }
}

/// Total return per unit staked when the price wins
pub fn decimal_payout(price: f64, convention: PriceConvention) -> Option<f64> {
    odds_to_probability(price, convention).map(|p| 1.0 / p)
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Log-odds of a probability, clamped away from 0 and 1
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(0.01, 0.99);
    (p / (1.0 - p)).ln()
}

/// How the market probabilities for a prop were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSource {
    BothSides,
    OverOnly,
    UnderOnly,
    /// No usable price; both sides treated as 0.5
    Unpriced,
}

/// Over / under implied probabilities from a two-sided quote.
///
/// When one side is missing (or unusable) it is estimated as
/// `1 - known + vig_margin`; with neither side both default to 0.5.
pub fn market_probabilities(
    quote: &PriceQuote,
    convention: PriceConvention,
    vig_margin: f64,
) -> (f64, f64, MarketSource) {
    let over = quote
        .over_price
        .and_then(|p| odds_to_probability(p, convention));
    let under = quote
        .under_price
        .and_then(|p| odds_to_probability(p, convention));

    match (over, under) {
        (Some(o), Some(u)) => (o, u, MarketSource::BothSides),
        (Some(o), None) => (o, 1.0 - o + vig_margin, MarketSource::OverOnly),
        (None, Some(u)) => (1.0 - u + vig_margin, u, MarketSource::UnderOnly),
        (None, None) => (0.5, 0.5, MarketSource::Unpriced),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_american_examples() {
        let p = odds_to_probability(-110.0, PriceConvention::American).unwrap();
        assert!((p - 0.5238).abs() < 1e-4);
        let p = odds_to_probability(150.0, PriceConvention::American).unwrap();
        assert!((p - 0.4).abs() < 1e-12);
        assert!(odds_to_probability(0.0, PriceConvention::American).is_none());
    }

    #[test]
    fn test_decimal_payout() {
        let win = decimal_payout(150.0, PriceConvention::American).unwrap();
        assert!((win - 2.5).abs() < 1e-12);
        let fav = decimal_payout(-200.0, PriceConvention::American).unwrap();
        assert!((fav - 1.5).abs() < 1e-12);
        let dec = decimal_payout(1.91, PriceConvention::Decimal).unwrap();
        assert!((dec - 1.91).abs() < 1e-12);
        assert!(decimal_payout(1.0, PriceConvention::Decimal).is_none());
    }

    #[test]
    fn test_decimal_examples() {
        let p = odds_to_probability(2.5, PriceConvention::Decimal).unwrap();
        assert!((p - 0.4).abs() < 1e-12);
        assert!(odds_to_probability(1.0, PriceConvention::Decimal).is_none());
    }

    #[test]
    fn test_round_trip() {
        for price in [-450.0, -200.0, -115.0, 105.0, 135.0, 250.0, 900.0] {
            let p = odds_to_probability(price, PriceConvention::American).unwrap();
            let back = probability_to_odds(p, PriceConvention::American).unwrap();
            assert!((back - price).abs() < 1e-6, "{} -> {} -> {}", price, p, back);
        }
        for price in [1.2, 1.91, 2.0, 3.75, 11.0] {
            let p = odds_to_probability(price, PriceConvention::Decimal).unwrap();
            let back = probability_to_odds(p, PriceConvention::Decimal).unwrap();
            assert!((back - price).abs() < 1e-9);
        }
    }

    #[test]
    fn test_probability_bounds() {
        assert!(probability_to_odds(0.0, PriceConvention::American).is_none());
        assert!(probability_to_odds(1.0, PriceConvention::Decimal).is_none());
        assert!(probability_to_odds(f64::NAN, PriceConvention::Decimal).is_none());
    }

    #[test]
    fn test_one_sided_quote_estimates_other_side() {
        let quote = PriceQuote::new(Some(-120.0), None);
        let (over, under, source) = market_probabilities(&quote, PriceConvention::American, 0.05);
        assert_eq!(source, MarketSource::OverOnly);
        assert!((over + under - 1.05).abs() < 1e-12);

        let (over, under, source) =
            market_probabilities(&PriceQuote::default(), PriceConvention::American, 0.05);
        assert_eq!((over, under, source), (0.5, 0.5, MarketSource::Unpriced));
    }

    #[test]
    fn test_sigmoid_logit_inverse() {
        assert!((sigmoid(logit(0.5)) - 0.5).abs() < 1e-12);
        assert!((sigmoid(logit(0.3)) - 0.3).abs() < 1e-12);
        assert!((sigmoid(1.5) - 0.8176).abs() < 1e-4);
    }
}
