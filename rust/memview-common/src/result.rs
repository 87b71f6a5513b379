pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn check_positive(value: i64) -> super::Result<i64> {
        verify_arg!(value, value > 0);
        Ok(value)
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(check_positive(3).unwrap(), 3);
        let e = check_positive(-1).unwrap_err();
        match e.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "value");
                assert_eq!(message, "value > 0");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
