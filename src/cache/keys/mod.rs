/// 缓存键前缀
const SESSION_PREFIX: &str = "session:";
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成会话缓存键
pub fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, session_id)
}

/// 生成限流计数键
pub fn rate_limit_key(ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, ip)
}
