//! Human readable rendering of catalog results.

use std::fmt::{self, Display};

use anyhow::{Context, Result};
use pricewatch_catalog::{Offer, Product};
use serde::Serialize;

const CURRENCY: &str = "грн";

pub fn format_price(price: f64) -> String {
    format!("{price:.2} {CURRENCY}")
}

/// The date an offer is valid until, falling back to the raw value if it
/// isn't a date.
pub fn valid_until(product: &Product) -> String {
    product
        .last_updated_at()
        .map(|timestamp| timestamp.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| product.last_updated.clone())
}

/// Print `value` to stdout as pretty JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Could not serialize results")?;
    println!("{json}");
    Ok(())
}

/// One product per line, with its discount when there is one.
pub struct DisplayProducts<'a>(pub &'a [Product]);

impl Display for DisplayProducts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self.0.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
        for product in self.0 {
            write!(
                f,
                "{:>6}  {:<name_width$}  {:>14}",
                product.id,
                product.name,
                format_price(product.price),
            )?;
            if let Some(old_price) = product.old_price.filter(|_| product.has_discount()) {
                write!(f, "  (-{}%, was {})", product.discount(), format_price(old_price))?;
            }
            writeln!(f, "  {} / {}", product.store, product.category)?;
        }
        Ok(())
    }
}

/// Offers as listed on the offers screen.
pub struct DisplayOffers<'a>(pub &'a [Offer]);

impl Display for DisplayOffers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for offer in self.0 {
            write!(f, "{:>6}  {}", offer.id, offer.title)?;
            if offer.discount > 0 {
                write!(f, "  -{}%", offer.discount)?;
            }
            writeln!(f, "  at {} ({})", offer.store, offer.description)?;
        }
        Ok(())
    }
}

/// Every field of a single product.
pub struct DisplayProduct<'a>(pub &'a Product);

impl Display for DisplayProduct<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let product = self.0;
        writeln!(f, "{}", product.name)?;
        writeln!(f, "  price:       {}", format_price(product.price))?;
        if let Some(old_price) = product.old_price {
            writeln!(f, "  old price:   {}", format_price(old_price))?;
        }
        if product.has_discount() {
            writeln!(f, "  discount:    {}%", product.discount())?;
        }
        writeln!(f, "  store:       {}", product.store)?;
        writeln!(f, "  category:    {}", product.category)?;
        writeln!(f, "  valid until: {}", valid_until(product))?;
        write!(f, "  url:         {}", product.product_url)
    }
}
