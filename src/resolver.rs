use std::io;
use std::net::IpAddr;
use std::time::Duration;

/// Resolves `host` to its addresses, bounded by `timeout`.
///
/// IP literals are returned as-is without a lookup. A zone suffix
/// (`fe80::1%eth0`) is stripped before parsing.
pub async fn resolve(host: &str, timeout: Duration) -> io::Result<Vec<IpAddr>> {
    let literal = host.split('%').next().unwrap_or(host);
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let lookup = tokio::net::lookup_host((host, 0));
    let addrs = tokio::time::timeout(timeout, lookup)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, format!("resolving {host} timed out")))??;

    let mut ips: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }
    if ips.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, format!("no addresses found for {host}")));
    }
    Ok(ips)
}

/// Like [`resolve`], keeping only IPv4 addresses.
pub async fn resolve_v4(host: &str, timeout: Duration) -> io::Result<Vec<IpAddr>> {
    let ips: Vec<IpAddr> = resolve(host, timeout).await?.into_iter().filter(IpAddr::is_ipv4).collect();
    if ips.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, format!("no IPv4 address for {host}")));
    }
    Ok(ips)
}
