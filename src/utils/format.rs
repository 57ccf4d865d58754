use rust_decimal::Decimal;

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_ascii_uppercase().as_str() {
        "GBP" => "£",
        "EUR" => "€",
        "USD" => "$",
        _ => "",
    }
}

/// `1234.5` in `gbp` renders as `£1,234.50`. Unknown currencies keep their code.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let number = format!("{}.{}", group_thousands(whole), fraction);
    let sign = if negative { "-" } else { "" };

    match currency_symbol(currency) {
        "" => format!("{}{} {}", sign, number, currency.to_ascii_uppercase()),
        symbol => format!("{}{}{}", sign, symbol, number),
    }
}

/// Converts provider minor units (pence) into a decimal amount.
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

pub fn format_salary_range(min: Option<i32>, max: Option<i32>) -> Option<String> {
    let pounds = |v: i32| format!("£{}", group_thousands(&v.to_string()));
    match (min, max) {
        (Some(min), Some(max)) if min == max => Some(pounds(min)),
        (Some(min), Some(max)) => Some(format!("{} - {}", pounds(min), pounds(max))),
        (Some(min), None) => Some(format!("From {}", pounds(min))),
        (None, Some(max)) => Some(format!("Up to {}", pounds(max))),
        (None, None) => None,
    }
}
