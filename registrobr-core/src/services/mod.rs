//! 业务逻辑服务层

mod reconciliation_service;
mod zone_repository;

pub use reconciliation_service::ReconciliationService;
pub use zone_repository::ZoneRepository;
