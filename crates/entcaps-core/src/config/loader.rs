//! 统一环境变量加载逻辑
//!
//! 集中维护 fallback 链，避免在业务代码中重复 `or_else` 调用。

use std::env;
use std::str::FromStr;

/// 从主变量或别名链读取环境变量，失败时使用默认值
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env_optional(primary, aliases).unwrap_or_else(default)
}

/// 从主变量或别名链读取，返回 Option（空值视为未设置）
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// 解析布尔型环境变量：0/false/no/off 为 false，其余已设置的值为 true
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

/// 解析数值等类型；解析失败时记录 warn 并回退到默认值
pub fn env_parse<T>(primary: &str, aliases: &[&str], default: T) -> T
where
    T: FromStr,
{
    match env_optional(primary, aliases) {
        Some(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key = primary, value = %raw, "ignoring unparsable value");
                default
            }
        },
        None => default,
    }
}

/// 逗号分隔列表，去除空白与空项
pub fn env_list(primary: &str, aliases: &[&str]) -> Option<Vec<String>> {
    let raw = env_optional(primary, aliases)?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; the process environment is shared.

    #[test]
    fn test_env_optional_alias_and_empty() {
        env::set_var("ENTCAPS_TEST_OPT_ALIAS", "  value ");
        assert_eq!(
            env_optional("ENTCAPS_TEST_OPT_MISSING", &["ENTCAPS_TEST_OPT_ALIAS"]),
            Some("value".to_string())
        );
        env::set_var("ENTCAPS_TEST_OPT_EMPTY", "   ");
        assert_eq!(env_optional("ENTCAPS_TEST_OPT_EMPTY", &[]), None);
    }

    #[test]
    fn test_env_bool() {
        env::set_var("ENTCAPS_TEST_BOOL_OFF", "off");
        env::set_var("ENTCAPS_TEST_BOOL_ON", "1");
        assert!(!env_bool("ENTCAPS_TEST_BOOL_OFF", &[], true));
        assert!(env_bool("ENTCAPS_TEST_BOOL_ON", &[], false));
        assert!(env_bool("ENTCAPS_TEST_BOOL_UNSET", &[], true));
    }

    #[test]
    fn test_env_parse_falls_back() {
        env::set_var("ENTCAPS_TEST_PARSE_BAD", "lots");
        env::set_var("ENTCAPS_TEST_PARSE_GOOD", "42");
        assert_eq!(env_parse("ENTCAPS_TEST_PARSE_BAD", &[], 7usize), 7);
        assert_eq!(env_parse("ENTCAPS_TEST_PARSE_GOOD", &[], 7usize), 42);
    }

    #[test]
    fn test_env_list() {
        env::set_var("ENTCAPS_TEST_LIST", "sha-256, sha3-256,,");
        assert_eq!(
            env_list("ENTCAPS_TEST_LIST", &[]),
            Some(vec!["sha-256".to_string(), "sha3-256".to_string()])
        );
        env::set_var("ENTCAPS_TEST_LIST_BLANK", " , ");
        assert_eq!(env_list("ENTCAPS_TEST_LIST_BLANK", &[]), None);
    }
}
