//! `propedge odds` - price / probability conversions.

use anyhow::{bail, Result};
use clap::Args;

use super::output::{self, FieldRow};
use crate::domain::PriceConvention;
use crate::edge::{decimal_payout, odds_to_probability, probability_to_odds};

#[derive(Args, Debug, Clone)]
pub struct OddsArgs {
    /// Price to convert (American unless --decimal)
    #[arg(allow_negative_numbers = true)]
    pub price: f64,
    /// Treat the price as decimal odds
    #[arg(long)]
    pub decimal: bool,
}

impl OddsArgs {
    pub fn run(&self) -> Result<()> {
        let rows = self.rows()?;
        println!("{}", output::table(&rows));
        Ok(())
    }

    fn rows(&self) -> Result<Vec<FieldRow>> {
        let (from, to) = if self.decimal {
            (PriceConvention::Decimal, PriceConvention::American)
        } else {
            (PriceConvention::American, PriceConvention::Decimal)
        };

        let Some(probability) = odds_to_probability(self.price, from) else {
            bail!("{} is not a valid {:?} price", self.price, from);
        };

        let mut rows = vec![
            FieldRow::new("implied probability", format!("{:.4}", probability)),
            FieldRow::new("break-even hit rate", format!("{:.1}%", probability * 100.0)),
        ];
        if let Some(converted) = probability_to_odds(probability, to) {
            let label = match to {
                PriceConvention::American => "american",
                PriceConvention::Decimal => "decimal",
            };
            rows.push(FieldRow::new(label, format!("{:.2}", converted)));
        }
        if let Some(payout) = decimal_payout(self.price, from) {
            rows.push(FieldRow::new("profit per 100", format!("{:.2}", (payout - 1.0) * 100.0)));
        }
        Ok(rows)
    }
}
