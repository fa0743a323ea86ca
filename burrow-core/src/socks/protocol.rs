//! SOCKS5 wire format (RFC 1928), CONNECT without authentication only.

use crate::pool::DialError;
use crate::socks::error::SocksError;
use crate::transport::TransportErrorKind;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const SOCKS_VERSION: u8 = 0x05;

const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_NOT_ACCEPTABLE: u8 = 0xff;

const CMD_CONNECT: u8 = 0x01;

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Destination requested by the client.
///
/// Names are kept as given; resolution happens at the far end of the tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    Ip(SocketAddr),
    Domain(String, u16),
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{addr}"),
            TargetAddr::Domain(host, port) => write!(f, "{host}:{port}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reply {
    Succeeded = 0x00,
    GeneralFailure = 0x01,
    NotAllowed = 0x02,
    NetworkUnreachable = 0x03,
    HostUnreachable = 0x04,
    ConnectionRefused = 0x05,
    CommandNotSupported = 0x07,
    AddressTypeNotSupported = 0x08,
}

impl Reply {
    /// Reply code reported to the client for a failed dial.
    pub fn for_dial_error(err: &DialError) -> Self {
        match err {
            DialError::StreamOpen { source, .. } => match source.kind() {
                TransportErrorKind::ConnectionRefused => Reply::ConnectionRefused,
                TransportErrorKind::NetworkUnreachable => Reply::NetworkUnreachable,
                TransportErrorKind::NotAllowed => Reply::NotAllowed,
                TransportErrorKind::HostUnreachable | TransportErrorKind::Other => {
                    Reply::HostUnreachable
                }
            },
            DialError::Connect { .. } | DialError::PoolClosed => Reply::GeneralFailure,
        }
    }
}

/// Method negotiation: accept "no authentication" or refuse the client.
pub async fn negotiate<S>(stream: &mut S) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await?;

    let [version, n_methods] = header;
    if version != SOCKS_VERSION {
        return Err(SocksError::UnsupportedVersion(version));
    }

    let mut methods = vec![0u8; n_methods as usize];
    stream.read_exact(&mut methods).await?;

    if !methods.contains(&METHOD_NO_AUTH) {
        stream
            .write_all(&[SOCKS_VERSION, METHOD_NOT_ACCEPTABLE])
            .await?;
        return Err(SocksError::NoAcceptableMethod);
    }

    stream.write_all(&[SOCKS_VERSION, METHOD_NO_AUTH]).await?;
    Ok(())
}

/// Read the client's request and return the CONNECT destination.
///
/// Unsupported commands and address types are answered with the matching
/// reply code before the error is returned.
pub async fn read_request<S>(stream: &mut S) -> Result<TargetAddr, SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;

    let [version, command, _reserved, address_type] = header;
    if version != SOCKS_VERSION {
        return Err(SocksError::UnsupportedVersion(version));
    }

    let target = match address_type {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            stream.read_exact(&mut octets).await?;
            let port = stream.read_u16().await?;
            TargetAddr::Ip(SocketAddr::from((Ipv4Addr::from(octets), port)))
        }
        ATYP_IPV6 => {
            let mut octets = [0u8; 16];
            stream.read_exact(&mut octets).await?;
            let port = stream.read_u16().await?;
            TargetAddr::Ip(SocketAddr::from((Ipv6Addr::from(octets), port)))
        }
        ATYP_DOMAIN => {
            let len = stream.read_u8().await?;
            let mut name = vec![0u8; len as usize];
            stream.read_exact(&mut name).await?;
            let port = stream.read_u16().await?;
            let name = String::from_utf8(name).map_err(|_| SocksError::InvalidDomain)?;
            TargetAddr::Domain(name, port)
        }
        other => {
            write_reply(stream, Reply::AddressTypeNotSupported).await?;
            return Err(SocksError::UnsupportedAddressType(other));
        }
    };

    if command != CMD_CONNECT {
        write_reply(stream, Reply::CommandNotSupported).await?;
        return Err(SocksError::UnsupportedCommand(command));
    }

    Ok(target)
}

/// Send a reply with an unspecified bound address.
pub async fn write_reply<S>(stream: &mut S, reply: Reply) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(&[
            SOCKS_VERSION,
            reply as u8,
            0x00,
            ATYP_IPV4,
            0,
            0,
            0,
            0,
            0,
            0,
        ])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use pretty_assertions::assert_eq;
    use tokio::io::duplex;

    #[tokio::test]
    async fn accepts_no_auth_method() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x02, 0x02, 0x00]).await.unwrap();

        negotiate(&mut server).await.unwrap();

        let mut answer = [0u8; 2];
        client.read_exact(&mut answer).await.unwrap();
        assert_eq!(answer, [0x05, 0x00]);
    }

    #[tokio::test]
    async fn refuses_clients_without_no_auth() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();

        let err = negotiate(&mut server).await.unwrap_err();
        assert!(matches!(err, SocksError::NoAcceptableMethod));

        let mut answer = [0u8; 2];
        client.read_exact(&mut answer).await.unwrap();
        assert_eq!(answer, [0x05, 0xff]);
    }

    #[tokio::test]
    async fn rejects_socks4_greeting() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();

        let err = negotiate(&mut server).await.unwrap_err();
        assert!(matches!(err, SocksError::UnsupportedVersion(4)));
    }

    #[tokio::test]
    async fn parses_domain_request_without_resolving() {
        let (mut client, mut server) = duplex(64);
        let mut request = vec![0x05, 0x01, 0x00, 0x03, 11];
        request.extend_from_slice(b"example.com");
        request.extend_from_slice(&443u16.to_be_bytes());
        client.write_all(&request).await.unwrap();

        let target = read_request(&mut server).await.unwrap();

        assert_eq!(target, TargetAddr::Domain("example.com".to_string(), 443));
        assert_eq!(target.to_string(), "example.com:443");
    }

    #[tokio::test]
    async fn parses_ip_requests() {
        let (mut client, mut server) = duplex(64);
        client
            .write_all(&[0x05, 0x01, 0x00, 0x01, 10, 0, 0, 7, 0x1f, 0x90])
            .await
            .unwrap();
        let v4 = read_request(&mut server).await.unwrap();
        assert_eq!(v4.to_string(), "10.0.0.7:8080");

        let mut request = vec![0x05, 0x01, 0x00, 0x04];
        request.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        request.extend_from_slice(&22u16.to_be_bytes());
        client.write_all(&request).await.unwrap();
        let v6 = read_request(&mut server).await.unwrap();
        assert_eq!(v6.to_string(), "[::1]:22");
    }

    #[tokio::test]
    async fn answers_bind_with_command_not_supported() {
        let (mut client, mut server) = duplex(64);
        client
            .write_all(&[0x05, 0x02, 0x00, 0x01, 127, 0, 0, 1, 0, 80])
            .await
            .unwrap();

        let err = read_request(&mut server).await.unwrap_err();
        assert!(matches!(err, SocksError::UnsupportedCommand(0x02)));

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], Reply::CommandNotSupported as u8);
    }

    #[tokio::test]
    async fn answers_unknown_address_type() {
        let (mut client, mut server) = duplex(64);
        client.write_all(&[0x05, 0x01, 0x00, 0x09]).await.unwrap();

        let err = read_request(&mut server).await.unwrap_err();
        assert!(matches!(err, SocksError::UnsupportedAddressType(0x09)));

        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply[1], Reply::AddressTypeNotSupported as u8);
    }

    #[test]
    fn maps_dial_errors_to_reply_codes() {
        let open = |kind: TransportErrorKind| DialError::StreamOpen {
            slot: 0,
            address: "host:1".to_string(),
            source: TransportError::new("channel open failed").with_kind(kind),
        };

        assert_eq!(
            Reply::for_dial_error(&open(TransportErrorKind::ConnectionRefused)),
            Reply::ConnectionRefused
        );
        assert_eq!(
            Reply::for_dial_error(&open(TransportErrorKind::NetworkUnreachable)),
            Reply::NetworkUnreachable
        );
        assert_eq!(
            Reply::for_dial_error(&open(TransportErrorKind::NotAllowed)),
            Reply::NotAllowed
        );
        assert_eq!(
            Reply::for_dial_error(&open(TransportErrorKind::Other)),
            Reply::HostUnreachable
        );
        assert_eq!(
            Reply::for_dial_error(&DialError::Connect {
                slot: 1,
                source: TransportError::new("unreachable"),
            }),
            Reply::GeneralFailure
        );
        assert_eq!(
            Reply::for_dial_error(&DialError::PoolClosed),
            Reply::GeneralFailure
        );
    }

    #[test]
    fn reply_ignores_error_wording() {
        let err = DialError::StreamOpen {
            slot: 0,
            address: "host:1".to_string(),
            source: TransportError::new("Connection refused by policy"),
        };

        assert_eq!(Reply::for_dial_error(&err), Reply::HostUnreachable);
    }
}
