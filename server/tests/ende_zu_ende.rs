//! Ende-zu-Ende-Tests: echter TCP-Relay auf 127.0.0.1:0, Clients ueber
//! tuschel-client bzw. rohe Frames

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tuschel_client::{ChatClient, ClientError};
use tuschel_protocol::wire::{read_frame, write_frame, DEFAULT_MAX_FRAME_SIZE};
use tuschel_protocol::Ablehnung;
use tuschel_server::{config::ServerConfig, Server};

const CLIENT_BITS: u64 = 128;
const WARTEZEIT: Duration = Duration::from_secs(10);

struct TestServer {
    adresse: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<tuschel_relay::RelayResult<()>>,
}

impl TestServer {
    async fn starten(anpassen: impl FnOnce(&mut ServerConfig)) -> Self {
        let mut config = ServerConfig::default();
        config.netzwerk.bind_adresse = "127.0.0.1".into();
        config.netzwerk.port = 0;
        config.krypto.schluessel_bits = 256;
        anpassen(&mut config);

        let relay = Server::neu(config)
            .vorbereiten()
            .await
            .expect("Server konnte nicht vorbereitet werden");
        let adresse = relay.lokale_adresse().expect("Keine lokale Adresse");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(relay.starten(shutdown_rx));

        Self {
            adresse,
            shutdown_tx,
            handle,
        }
    }

    async fn client(&self, name: &str) -> ChatClient {
        ChatClient::verbinden_mit_neuem_schluessel(self.adresse, name, CLIENT_BITS, 62)
            .await
            .expect("Client konnte sich nicht verbinden")
    }

    async fn beenden(self) {
        self.shutdown_tx.send(true).expect("Shutdown-Signal nicht zustellbar");
        let ergebnis = timeout(WARTEZEIT, self.handle)
            .await
            .expect("Server hat nicht rechtzeitig beendet")
            .expect("Server-Task abgestuerzt");
        assert!(ergebnis.is_ok(), "Server mit Fehler beendet: {ergebnis:?}");
    }
}

async fn zeile(client: &mut ChatClient) -> String {
    timeout(WARTEZEIT, client.naechste_zeile())
        .await
        .expect("Keine Zeile innerhalb der Wartezeit")
        .expect("Empfang fehlgeschlagen")
}

fn endet_mit(zeile: &str, erwartet: &str) {
    assert!(
        zeile.starts_with('(') && zeile.ends_with(erwartet),
        "Zeile '{zeile}' endet nicht mit '{erwartet}'"
    );
}

#[tokio::test]
async fn test_beispiel_handshake_wird_angekuendigt() {
    let server = TestServer::starten(|_| {}).await;
    let mut bob = server.client("bob").await;

    let mut roh = TcpStream::connect(server.adresse).await.unwrap();
    write_frame(
        &mut roh,
        b"BASE: 16\nEXP: 11\nDIV: 1F4\nUNAME: alice\n",
        DEFAULT_MAX_FRAME_SIZE,
    )
    .await
    .unwrap();

    let antwort = timeout(WARTEZEIT, read_frame(&mut roh, DEFAULT_MAX_FRAME_SIZE))
        .await
        .expect("Keine Antwort")
        .unwrap()
        .expect("Verbindung vorzeitig geschlossen");

    // Annahme statt Ablehnung, verschluesselt in Basis 16
    assert_eq!(Ablehnung::aus_antwort(&antwort), None);
    assert!(antwort.iter().all(|b| b.is_ascii_hexdigit() || *b == b'\n'));

    endet_mit(&zeile(&mut bob).await, "SERVER: alice joined the chat");

    server.beenden().await;
}

#[tokio::test]
async fn test_doppelter_name_wird_abgelehnt_und_getrennt() {
    let server = TestServer::starten(|_| {}).await;
    let mut alice = server.client("alice").await;

    let fehler = ChatClient::verbinden_mit_neuem_schluessel(server.adresse, "alice", CLIENT_BITS, 62)
        .await
        .err()
        .expect("Zweite alice darf nicht zugelassen werden");
    assert!(matches!(fehler, ClientError::Abgelehnt(Ablehnung::NameVergeben)));

    // Auf Frame-Ebene: genau die Ablehnungszeile, danach Verbindungsende
    let mut roh = TcpStream::connect(server.adresse).await.unwrap();
    write_frame(
        &mut roh,
        b"BASE: 16\nEXP: 11\nDIV: 1F4\nUNAME: alice\n",
        DEFAULT_MAX_FRAME_SIZE,
    )
    .await
    .unwrap();
    let antwort = read_frame(&mut roh, DEFAULT_MAX_FRAME_SIZE).await.unwrap().unwrap();
    assert_eq!(&antwort[..], b"Username already exists\n");
    let ende = timeout(WARTEZEIT, read_frame(&mut roh, DEFAULT_MAX_FRAME_SIZE))
        .await
        .expect("Verbindung wurde nicht geschlossen");
    assert!(matches!(ende, Ok(None)));

    // Die erste alice ist weiterhin aktiv
    alice.senden("noch da").await.unwrap();
    endet_mit(&zeile(&mut alice).await, "alice: noch da");

    server.beenden().await;
}

#[tokio::test]
async fn test_chat_wird_an_alle_weitergeleitet() {
    let server = TestServer::starten(|_| {}).await;
    let mut alice = server.client("alice").await;
    let mut bob = server.client("bob").await;

    endet_mit(&zeile(&mut alice).await, "SERVER: bob joined the chat");

    alice.senden("hallo bob").await.unwrap();
    endet_mit(&zeile(&mut bob).await, "alice: hallo bob");
    endet_mit(&zeile(&mut alice).await, "alice: hallo bob");

    server.beenden().await;
}

#[tokio::test]
async fn test_abmeldung_wird_angekuendigt() {
    let server = TestServer::starten(|_| {}).await;
    let mut alice = server.client("alice").await;
    let bob = server.client("bob").await;
    endet_mit(&zeile(&mut alice).await, "SERVER: bob joined the chat");

    bob.trennen().await.unwrap();
    endet_mit(&zeile(&mut alice).await, "SERVER: bob left the chat");

    // Name ist wieder frei
    let _bob = server.client("bob").await;
    endet_mit(&zeile(&mut alice).await, "SERVER: bob joined the chat");

    server.beenden().await;
}

#[tokio::test]
async fn test_volle_registry_lehnt_ab() {
    let server = TestServer::starten(|c| c.server.max_clients = 1).await;
    let _alice = server.client("alice").await;

    let fehler = ChatClient::verbinden_mit_neuem_schluessel(server.adresse, "bob", CLIENT_BITS, 62)
        .await
        .err()
        .expect("Server ist voll");
    assert!(matches!(fehler, ClientError::Abgelehnt(Ablehnung::ServerVoll)));

    server.beenden().await;
}

#[tokio::test]
async fn test_ungueltige_anfrage_erhaelt_klartext_grund() {
    let server = TestServer::starten(|_| {}).await;

    let mut roh = TcpStream::connect(server.adresse).await.unwrap();
    write_frame(&mut roh, b"BASE: 99\nEXP: 11\nDIV: 1F4\nUNAME: x\n", DEFAULT_MAX_FRAME_SIZE)
        .await
        .unwrap();
    let antwort = read_frame(&mut roh, DEFAULT_MAX_FRAME_SIZE).await.unwrap().unwrap();
    assert_eq!(&antwort[..], b"Invalid BASE value\n");

    server.beenden().await;
}

#[tokio::test]
async fn test_stummer_client_wird_nach_heartbeats_getrennt() {
    let server = TestServer::starten(|c| {
        c.server.heartbeat_sek = 1;
        c.server.max_verpasste_heartbeats = 2;
    })
    .await;
    let mut alice = server.client("alice").await;
    // carol liest nie und bestaetigt keine Heartbeats
    let _carol = server.client("carol").await;

    endet_mit(&zeile(&mut alice).await, "SERVER: carol joined the chat");
    // alice beantwortet Heartbeats in naechste_zeile automatisch
    endet_mit(&zeile(&mut alice).await, "SERVER: carol left the chat");

    server.beenden().await;
}

#[tokio::test]
async fn test_gleichzeitiger_doppelter_name_laesst_genau_einen_zu() {
    let server = TestServer::starten(|_| {}).await;

    let (erste, zweite) = tokio::join!(
        ChatClient::verbinden_mit_neuem_schluessel(server.adresse, "alice", CLIENT_BITS, 62),
        ChatClient::verbinden_mit_neuem_schluessel(server.adresse, "alice", CLIENT_BITS, 62),
    );

    let (zugelassen, abgelehnt) = match (erste, zweite) {
        (Ok(client), Err(fehler)) | (Err(fehler), Ok(client)) => (client, fehler),
        (Ok(_), Ok(_)) => panic!("Beide alice wurden zugelassen"),
        (Err(a), Err(b)) => panic!("Keine alice zugelassen: {a:?} / {b:?}"),
    };
    assert!(matches!(abgelehnt, ClientError::Abgelehnt(Ablehnung::NameVergeben)));

    let mut alice = zugelassen;
    alice.senden("einzige").await.unwrap();
    endet_mit(&zeile(&mut alice).await, "alice: einzige");

    server.beenden().await;
}

#[tokio::test]
async fn test_verbindung_ohne_handshake_wird_geschlossen() {
    let server = TestServer::starten(|c| c.server.heartbeat_sek = 1).await;

    // Verbindet, sendet aber nie eine Anfrage
    let mut roh = TcpStream::connect(server.adresse).await.unwrap();
    let ende = timeout(WARTEZEIT, read_frame(&mut roh, DEFAULT_MAX_FRAME_SIZE))
        .await
        .expect("Wartende Verbindung wurde nicht geschlossen");
    assert!(matches!(ende, Ok(None)));

    server.beenden().await;
}
