pub fn format_numbers(n: u64) -> String {
    match n {
        n if n > 1_000_000_000 => format!("{:0.1}B", n as f64 / 1_000_000_000.0),
        n if n > 1_000_000 => format!("{:0.1}M", n as f64 / 1_000_000.0),
        n if n > 1_000 => format!("{:0.1}K", n as f64 / 1_000.0),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod test {
    use crate::utils::numbers::format_numbers;

    #[test]
    fn test_format_b() {
        assert_eq!(format_numbers(2_736_123_123), "2.7B".to_string())
    }

    #[test]
    fn test_format_m() {
        assert_eq!(format_numbers(2_336_123), "2.3M".to_string())
    }

    #[test]
    fn test_format_k() {
        assert_eq!(format_numbers(4_536), "4.5K".to_string())
    }

    #[test]
    fn test_format() {
        assert_eq!(format_numbers(789), "789".to_string())
    }
}
