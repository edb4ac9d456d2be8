pub mod audit_logs;
pub mod records;

pub use audit_logs::Entity as AuditLogs;
pub use records::Entity as Records;
