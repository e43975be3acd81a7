//! 价格格式化

use crate::models::AssetType;

/// 整数部分按千位加逗号
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 保留 `decimals` 位小数并加千位分隔符
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// 股票价格统一为越南盾：小于 1000 视为千越南盾
pub fn stock_price_in_vnd(price: f64) -> f64 {
    if price >= 1000.0 {
        price
    } else {
        price * 1000.0
    }
}

/// 展示用价格
///
/// - 股票：`38,750 đ`
/// - 贵金属、加密货币：`$4,900.00`，低于 1 美元的币种保留 6 位小数
/// - 非正数：`-`
pub fn format_price(price: f64, asset_type: AssetType) -> String {
    if !price.is_finite() || price <= 0.0 {
        return "-".to_string();
    }

    match asset_type {
        AssetType::Stock => format!("{} đ", format_number(stock_price_in_vnd(price).round(), 0)),
        AssetType::Metal => format!("${}", format_number(price, 2)),
        AssetType::Crypto if price < 1.0 => format!("${}", format_number(price, 6)),
        AssetType::Crypto => format!("${}", format_number(price, 2)),
    }
}

/// 提示词中的价格，股票以越南盾表示
pub fn format_price_for_prompt(price: f64, asset_type: AssetType) -> String {
    if !price.is_finite() || price <= 0.0 {
        return "N/A".to_string();
    }

    match asset_type {
        AssetType::Stock => format!("{} VND", format_number((price * 1000.0).round(), 0)),
        _ => format!("${}", format_number(price, 2)),
    }
}

/// 带符号的涨跌幅，如 `+1.25%`
pub fn format_change(change: f64) -> String {
    let change = if change.is_finite() { change } else { 0.0 };
    if change >= 0.0 {
        format!("+{:.2}%", change)
    } else {
        format!("{:.2}%", change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_prices() {
        assert_eq!(format_price(38.75, AssetType::Stock), "38,750 đ");
        assert_eq!(format_price(38750.0, AssetType::Stock), "38,750 đ");
        assert_eq!(format_price(148.2, AssetType::Stock), "148,200 đ");
        assert_eq!(format_price(0.0, AssetType::Stock), "-");
    }

    #[test]
    fn test_usd_prices() {
        assert_eq!(format_price(4900.0, AssetType::Metal), "$4,900.00");
        assert_eq!(format_price(79.456, AssetType::Metal), "$79.46");
        assert_eq!(format_price(105000.5, AssetType::Crypto), "$105,000.50");
        assert_eq!(format_price(0.000012, AssetType::Crypto), "$0.000012");
        assert_eq!(format_price(-3.0, AssetType::Crypto), "-");
    }

    #[test]
    fn test_prompt_and_change() {
        assert_eq!(format_price_for_prompt(68.5, AssetType::Stock), "68,500 VND");
        assert_eq!(format_price_for_prompt(4890.15, AssetType::Metal), "$4,890.15");
        assert_eq!(format_price_for_prompt(0.0, AssetType::Metal), "N/A");
        assert_eq!(format_change(1.254), "+1.25%");
        assert_eq!(format_change(-0.7), "-0.70%");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
    }
}
