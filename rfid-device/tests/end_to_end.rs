//! Host and node talking over an in-memory link

use rfid_device::{card_hash, AccessState, Channel, Node, SimulatedHardware};
use rfid_protocol::MessageKind;
use rfid_security::{derive_tag, CounterTriple, HandshakeInitiator, SecretDerivation};
use rfid_transport::MemoryTransport;

fn secrets() -> SecretDerivation {
    SecretDerivation::new("door-handshake", "door-operational")
}

#[tokio::test]
async fn test_full_access_cycle() {
    let (transport, mut host_link) = MemoryTransport::pair();
    let board = SimulatedHardware::new();
    let mut node = Node::new(transport, board.clone(), secrets());

    // commands before the handshake are refused
    host_link.send_line("CMD_ENABLE|0123456789abcdef0123456789abcdef").unwrap();
    node.tick().await.unwrap();
    assert_eq!(
        host_link.drain(),
        vec!["ERR_NOT AUTHENTICATED", "ERR_AUTHENTICATION FAILED"]
    );

    let initiator = HandshakeInitiator::with_triple(secrets(), CounterTriple::new(10, 5, 100));
    host_link.send_line(&initiator.handshake_line()).unwrap();
    node.tick().await.unwrap();
    assert_eq!(host_link.drain(), vec!["OK_HANDSHAKE SUCCESSFUL"]);
    let mut host = initiator.establish();

    let enable = host.tagged_line(MessageKind::Cmd, "ENABLE");
    assert_eq!(
        enable,
        format!("CMD_ENABLE|{}", derive_tag("door-operational", 10, 5, 100))
    );
    host_link.send_line(&enable).unwrap();
    node.tick().await.unwrap();
    assert_eq!(host_link.drain(), vec!["ACK_RECEIVED ENABLE", "OK_ENABLE"]);
    assert_eq!(node.session().init(), 15);
    assert!(board.indicator(Channel::Armed));
    assert!(board.indicator(Channel::Session));

    let uid = [0x04, 0x52, 0x9C, 0x1A, 0x6B, 0x80];
    board.present_card(&uid);
    node.tick().await.unwrap();
    assert_eq!(host_link.drain(), vec![format!("OK_{}", card_hash(&uid))]);
    assert_eq!(node.controller().state(), AccessState::Unavailable);

    host_link.send_line(&host.tagged_line(MessageKind::Cmd, "permit")).unwrap();
    node.tick().await.unwrap();
    assert_eq!(host_link.drain(), vec!["ACK_RECEIVED PERMIT", "OK_PERMIT"]);
    assert!(board.indicator(Channel::Granted));

    // a replayed command is refused
    host_link.send_line(&enable).unwrap();
    node.tick().await.unwrap();
    assert_eq!(host_link.drain(), vec!["ERR_AUTHENTICATION FAILED"]);
    assert_eq!(node.controller().state(), AccessState::Unavailable);
}

#[tokio::test]
async fn test_handshake_with_wrong_secret_is_refused() {
    let (transport, mut host_link) = MemoryTransport::pair();
    let mut node = Node::new(transport, SimulatedHardware::new(), secrets());

    let impostor = HandshakeInitiator::with_triple(
        SecretDerivation::new("guess", "door-operational"),
        CounterTriple::new(10, 5, 100),
    );
    host_link.send_line(&impostor.handshake_line()).unwrap();
    node.tick().await.unwrap();

    assert_eq!(host_link.drain(), vec!["ERR_HANDSHAKE FAILED"]);
    assert!(!node.session().is_authenticated());
}

#[tokio::test]
async fn test_random_handshake_is_accepted() {
    let (transport, mut host_link) = MemoryTransport::pair();
    let mut node = Node::new(transport, SimulatedHardware::new(), secrets());

    let initiator = HandshakeInitiator::new(secrets());
    let triple = initiator.triple();
    host_link.send_line(&initiator.handshake_line()).unwrap();
    node.tick().await.unwrap();

    assert_eq!(host_link.drain(), vec!["OK_HANDSHAKE SUCCESSFUL"]);
    assert_eq!(node.session().init(), triple.init);
    assert_eq!(node.session().limit(), triple.limit);
}
