//! Amount helpers. Catalog prices are whole rupees; derived amounts such as
//! tax are carried in paise so they stay exact.

pub fn rupees_to_paise(rupees: i64) -> i64 {
    rupees * 100
}

/// Percentage of an amount in paise, rounded half up.
pub fn percent_of(paise: i64, basis_points: i64) -> i64 {
    (paise * basis_points + 5_000) / 10_000
}

/// `123456789` paise -> `1,234,567.89`.
pub fn format_paise(paise: i64) -> String {
    let negative = paise < 0;
    let paise = paise.abs();
    let whole = (paise / 100).to_string();
    let fraction = paise % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{grouped}.{fraction:02}", if negative { "-" } else { "" })
}
