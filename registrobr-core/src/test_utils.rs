//! 测试辅助模块
//!
//! 基于脚本化的 `MockTransport` 构造已登录的仓库。

use std::sync::Arc;

use registrobr_provider::mock::MockTransport;
use registrobr_provider::{Credentials, HttpResponse, Session, SessionConfig, StaticOtp};

use crate::services::{ReconciliationService, ZoneRepository};

pub const DOMAINS_JSON: &str = r#"{"domains":[{"Id":1001,"FQDN":"example.com.br","ExpirationDate":"2027-05-10","Status":"Publicado","Contact":"ABC123","PayLink":null,"Auctionable":0}]}"#;

pub fn test_credentials() -> Credentials {
    Credentials::new("user@example.com", "s3cret")
}

/// 未登录的仓库
pub fn repository(mock: &Arc<MockTransport>) -> ZoneRepository {
    ZoneRepository::new(Session::with_transport(
        &SessionConfig::default(),
        mock.clone(),
    ))
}

/// 已登录的仓库（消耗三条脚本化响应）
pub async fn logged_in_repository(mock: &Arc<MockTransport>) -> ZoneRepository {
    mock.push_login("req-1");
    let mut repo = repository(mock);
    repo.login(&test_credentials(), &StaticOtp(None))
        .await
        .unwrap();
    repo
}

/// 已登录并已加载 `example.com.br` 区域的服务
pub async fn service_with_zone(mock: &Arc<MockTransport>, records: &[&str]) -> ReconciliationService {
    let mut repo = logged_in_repository(mock).await;
    mock.push(HttpResponse::ok(registrobr_provider::mock::zone_page(records)));
    repo.zone_info("example.com.br", false).await.unwrap();
    ReconciliationService::new(repo)
}
