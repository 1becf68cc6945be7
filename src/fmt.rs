/// Format integer yen with thousands separators: ¥4,800
pub fn yen(val: i64) -> String {
    let negative = val < 0;
    let digits = val.abs().to_string();

    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-¥{with_commas}")
    } else {
        format!("¥{with_commas}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yen_formatting() {
        assert_eq!(yen(4800), "¥4,800");
        assert_eq!(yen(-500), "-¥500");
        assert_eq!(yen(0), "¥0");
        assert_eq!(yen(1000000), "¥1,000,000");
        assert_eq!(yen(42), "¥42");
    }
}
