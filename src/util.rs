use std::net::Ipv4Addr;

const AGENT_PORT: &str = "AGENT_PORT";

const DEFAULT_PORT: u16 = 8161;

pub fn get_default_port() -> u16 {
    DEFAULT_PORT
}

pub fn get_port() -> Option<u16> {
    std::env::var(AGENT_PORT).ok()?.parse().ok()
}

const AGENT_ADDR: &str = "AGENT_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 0);

pub fn get_addr() -> Ipv4Addr {
    let addr_from_env = std::env::var(AGENT_ADDR);
    addr_from_env.map_or(DEFAULT_ADDR, |res| res.parse().unwrap_or(DEFAULT_ADDR))
}

const AGENT_MAIL_TOKEN: &str = "AGENT_MAIL_TOKEN";

pub fn get_mail_token() -> Option<String> {
    std::env::var(AGENT_MAIL_TOKEN).ok()
}
