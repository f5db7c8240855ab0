//! Rings up one scripted sale and prints the PIX "copia e cola" string.
//!
//! ```text
//! checkout-demo [path/to/checkout.toml]
//! ```
//!
//! Without a usable config file the demo falls back to a sample merchant.

use std::path::PathBuf;

use caixa_checkout::{init_tracing, CheckoutConfig, CheckoutSession};
use caixa_core::pix::{FixedStatusSource, QrCodeEncoder};
use caixa_core::{Money, PaymentStatusReport, Percent, PixKeyType};
use chrono::Utc;
use tracing::warn;

fn sample_config() -> CheckoutConfig {
    let mut config = CheckoutConfig::default();
    config.merchant.name = "Padaria Pão Quente".into();
    config.merchant.city = "Recife".into();
    config.merchant.pix_key = "11.222.333/0001-81".into();
    config.merchant.pix_key_type = PixKeyType::Cnpj;
    config
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match CheckoutConfig::load(std::env::args().nth(1).map(PathBuf::from)) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Using sample merchant");
            sample_config()
        }
    };

    let mut session = CheckoutSession::new(config)?;

    let cart = session.cart_mut();
    cart.add_item("7891000100103", "Pão francês (kg)", Money::from_cents(1490), 1)?;
    cart.add_item("7896004000015", "Café torrado 500g", Money::from_cents(1875), 2)?;
    cart.add_item("7891910000197", "Leite integral 1L", Money::from_cents(549), 6)?;
    cart.set_item_discount("7891910000197", Money::zero(), Percent::from_whole(15)?)?;
    cart.redeem_loyalty_points(250, 1200)?;
    session.apply_coupon("DESCONTO10")?;

    let sale = session.finalize()?;
    let totals = &sale.totals;

    println!("Venda {}", sale.transaction_id);
    for line in &totals.lines {
        println!(
            "  {:<16} {:>14} {:>14}",
            line.id,
            line.subtotal.to_string(),
            line.total.to_string()
        );
    }
    println!("Subtotal   {:>14}", totals.subtotal.to_string());
    println!("Descontos  {:>14}", totals.total_discount.to_string());
    println!("Total      {:>14}", totals.total.to_string());
    println!("Pontos ganhos: {}", sale.loyalty_points_earned);

    if let Some(pix) = &sale.pix {
        println!();
        println!("PIX copia e cola:");
        println!("{}", pix.copy_and_paste);
        println!();
        print!("{}", session.render_qr(&QrCodeEncoder, &sale)?.to_text());
    }

    let source = FixedStatusSource::new().with_report(
        sale.transaction_id.clone(),
        PaymentStatusReport::completed(sale.amount_due(), Utc::now()),
    );
    let report = session.await_payment(&source, &sale)?;
    println!("Status: {:?}", report.status);

    Ok(())
}
