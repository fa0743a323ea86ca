use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Minimal SOCKS5 client: no-auth handshake, then CONNECT to an IPv4 target.
///
/// Returns the reply code and the stream, ready for relaying on success.
pub async fn socks_connect(proxy: SocketAddr, target: SocketAddr) -> (u8, TcpStream) {
    let mut stream = TcpStream::connect(proxy).await.expect("proxy unreachable");

    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut method = [0u8; 2];
    stream.read_exact(&mut method).await.unwrap();
    assert_eq!(method, [0x05, 0x00], "proxy refused no-auth");

    let IpAddr::V4(ip) = target.ip() else {
        panic!("socks_connect only handles IPv4 targets");
    };
    let mut request = vec![0x05, 0x01, 0x00, 0x01];
    request.extend_from_slice(&ip.octets());
    request.extend_from_slice(&target.port().to_be_bytes());
    stream.write_all(&request).await.unwrap();

    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], 0x05);

    (reply[1], stream)
}
