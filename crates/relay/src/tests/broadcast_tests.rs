//! Unit-Tests fuer den Best-Effort-Broadcast

use super::mock::{test_kern, zeile_passt, zulassen, TestClient};
use crate::error::RelayError;

#[test]
fn test_broadcast_erreicht_alle_sitzungen() {
    let mut kern = test_kern();
    let clients: Vec<TestClient> = ["a", "b", "c"]
        .iter()
        .enumerate()
        .map(|(i, name)| TestClient::neu(i as u64 + 1, name))
        .collect();
    for client in &clients {
        zulassen(&mut kern, client);
    }

    kern.rundsenden("SERVER", "Wartung in 5 Minuten", None)
        .expect("Broadcast fehlgeschlagen");

    for client in &clients {
        let zeilen = client.zeilen(kern.zustellung());
        assert!(zeile_passt(zeilen.last().unwrap(), "SERVER", "Wartung in 5 Minuten"));
    }
}

#[test]
fn test_broadcast_teilausfall_entfernt_nur_den_ausgefallenen() {
    let mut kern = test_kern();
    let erster = TestClient::neu(1, "erster");
    let zweiter = TestClient::neu(2, "zweiter");
    let dritter = TestClient::neu(3, "dritter");
    zulassen(&mut kern, &erster);
    zulassen(&mut kern, &zweiter);
    zulassen(&mut kern, &dritter);
    let vorher_zweiter = kern.zustellung().nachrichten(zweiter.id).len();

    kern.zustellung_mut().defekt.insert(zweiter.id);
    let ergebnis = kern.rundsenden("erster", "hallo", None);

    match ergebnis {
        Err(RelayError::BroadcastTeilweise { fehlgeschlagen }) => assert_eq!(fehlgeschlagen, 1),
        anders => panic!("Teilausfall erwartet, erhalten: {anders:?}"),
    }

    // Erster und dritter haben die Zeile und danach die Austrittsmeldung
    for client in [&erster, &dritter] {
        let zeilen = client.zeilen(kern.zustellung());
        let n = zeilen.len();
        assert!(zeile_passt(&zeilen[n - 2], "erster", "hallo"));
        assert!(zeile_passt(&zeilen[n - 1], "SERVER", "zweiter left the chat"));
    }

    // Der zweite ist entfernt, geschlossen und hat nichts Neues erhalten
    assert!(kern.registry().finden(zweiter.id).is_none());
    assert!(kern.zustellung().ist_geschlossen(zweiter.id));
    assert_eq!(kern.zustellung().nachrichten(zweiter.id).len(), vorher_zweiter);
    assert_eq!(kern.registry().handles(), vec![erster.id, dritter.id]);
}

#[test]
fn test_ausfall_waehrend_austrittsmeldung_wird_ebenfalls_gemeldet() {
    let mut kern = test_kern();
    let a = TestClient::neu(1, "a");
    let b = TestClient::neu(2, "b");
    let c = TestClient::neu(3, "c");
    zulassen(&mut kern, &a);
    zulassen(&mut kern, &b);
    zulassen(&mut kern, &c);

    kern.zustellung_mut().defekt.insert(a.id);
    kern.zustellung_mut().defekt.insert(b.id);

    let ergebnis = kern.rundsenden("c", "hallo", None);
    assert!(matches!(
        ergebnis,
        Err(RelayError::BroadcastTeilweise { fehlgeschlagen: 2 })
    ));

    // c erfaehrt von beiden Austritten
    let zeilen = c.zeilen(kern.zustellung());
    assert!(zeilen.iter().any(|z| zeile_passt(z, "SERVER", "a left the chat")));
    assert!(zeilen.iter().any(|z| zeile_passt(z, "SERVER", "b left the chat")));
    assert_eq!(kern.registry().handles(), vec![c.id]);
}

#[test]
fn test_chat_mit_ausgefallenem_empfaenger_meldet_fehler() {
    let mut kern = test_kern();
    let alice = TestClient::neu(1, "alice");
    let bob = TestClient::neu(2, "bob");
    zulassen(&mut kern, &alice);
    zulassen(&mut kern, &bob);
    kern.zustellung_mut().defekt.insert(bob.id);

    let nachricht = alice.verschluesselt(&kern, "hallo bob");
    let fehler = kern.client_nachricht(alice.id, &nachricht).unwrap_err();

    assert!(matches!(fehler, RelayError::BroadcastTeilweise { .. }));
    assert!(!fehler.ist_fatal());
    assert!(kern.registry().finden(bob.id).is_none());
    assert!(kern.registry().finden(alice.id).is_some());
}

#[test]
fn test_broadcast_ohne_sitzungen() {
    let mut kern = test_kern();
    kern.rundsenden("SERVER", "niemand da", None).unwrap();
    assert!(kern.zustellung().gesendet.is_empty());
}
