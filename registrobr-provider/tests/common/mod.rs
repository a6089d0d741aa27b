//! 共享测试工具和辅助函数

#![allow(dead_code)]

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

pub fn login_page(token: &str) -> String {
    format!(
        r#"<html><body><form><input type="hidden" id="request-token" value="{token}"></form></body></html>"#
    )
}

pub fn panel_page(request_token: &str) -> String {
    format!(r#"<html><body><input type="hidden" id="request_token" value="{request_token}"></body></html>"#)
}

pub fn zone_page(records: &[&str]) -> String {
    let inputs: String = records
        .iter()
        .enumerate()
        .map(|(i, r)| format!(r#"<input type="hidden" id="rr-{i}" value="{r}">"#))
        .collect();
    format!(r#"<html><body><input id="rr-new" value=""><form>{inputs}</form></body></html>"#)
}
