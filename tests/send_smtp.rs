//! End-to-end sends against an in-process scripted SMTP server.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use smtp_mailer::{BodyMode, Credentials, Mailer, Mechanism, RecipientKind};

/// Spawns a minimal SMTP server on an ephemeral port. It answers each
/// command with a canned reply, accepts one DATA payload (answered with
/// `data_reply`), and returns every line it received once the client quits.
fn spawn_server(data_reply: &'static str) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut writer = stream;
        let mut captured = Vec::new();

        writer.write_all(b"220 mock ESMTP\r\n").expect("banner");

        let mut in_data = false;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).expect("read") == 0 {
                break;
            }
            captured.push(line.trim_end_matches("\r\n").to_string());

            if in_data {
                if line == ".\r\n" {
                    in_data = false;
                    writer.write_all(data_reply.as_bytes()).expect("data reply");
                }
                continue;
            }

            let upper = line.to_ascii_uppercase();
            if upper.starts_with("QUIT") {
                writer.write_all(b"221 bye\r\n").expect("quit reply");
                break;
            }
            let reply: &[u8] = if upper.starts_with("EHLO") || upper.starts_with("HELO") {
                b"250 mock greets you\r\n"
            } else if upper.starts_with("AUTH") {
                b"235 2.7.0 accepted\r\n"
            } else if upper.starts_with("DATA") {
                in_data = true;
                b"354 end data with <CRLF>.<CRLF>\r\n"
            } else {
                b"250 ok\r\n"
            };
            writer.write_all(reply).expect("reply");
        }

        captured
    });

    (port, handle)
}

#[test]
fn sends_plain_text_message() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (port, server) = spawn_server("250 queued as 42\r\n");

    let mut mailer = Mailer::new("127.0.0.1", port).hello_name("client.test");
    mailer
        .add_address("to@example.org", Some("Recipient"), RecipientKind::To)
        .unwrap();

    let response = mailer
        .send(
            "from@example.org",
            Some("Sender"),
            "Hello",
            "Hello example",
            BodyMode::Text,
            None,
        )
        .expect("send should succeed");
    assert!(response.has_code(250));

    let captured = server.join().expect("server thread");
    assert!(captured.contains(&"EHLO client.test".to_string()));
    assert!(captured.contains(&"MAIL FROM:<from@example.org>".to_string()));
    assert!(captured.contains(&"RCPT TO:<to@example.org>".to_string()));
    assert!(captured.contains(&"DATA".to_string()));
    assert!(captured.contains(&"Hello example".to_string()));
    assert!(captured.contains(&".".to_string()));
    assert!(captured.contains(&"QUIT".to_string()));

    // the transcript carries the whole exchange
    let lines: Vec<&str> = mailer.logs().iter().map(|e| e.line.as_str()).collect();
    assert!(lines.contains(&"220 mock ESMTP"));
    assert!(lines.contains(&"# EHLO client.test"));
    assert!(lines.contains(&"250 mock greets you"));
    assert!(lines.contains(&"# DATA"));
    assert!(lines.contains(&"250 queued as 42"));
    assert!(lines.contains(&"# QUIT"));
    assert!(lines.contains(&"221 bye"));
}

#[test]
fn authenticates_before_the_envelope() {
    let (port, server) = spawn_server("250 queued\r\n");

    let mut mailer = Mailer::new("127.0.0.1", port)
        .hello_name("client.test")
        .credentials(
            Credentials::new("user@example.org".to_string(), "token".to_string()),
            Mechanism::Xoauth2,
        );
    mailer
        .add_address("to@example.org", None, RecipientKind::To)
        .unwrap();

    mailer
        .send("from@example.org", None, "s", "b", BodyMode::Text, None)
        .expect("send should succeed");

    let captured = server.join().expect("server thread");
    let auth = captured
        .iter()
        .position(|l| l.starts_with("AUTH XOAUTH2 "))
        .expect("AUTH sent");
    let mail = captured
        .iter()
        .position(|l| l.starts_with("MAIL FROM"))
        .expect("MAIL sent");
    assert!(auth < mail);
}

#[test]
fn rejected_data_still_quits() {
    let (port, server) = spawn_server("554 transaction failed\r\n");

    let mut mailer = Mailer::new("127.0.0.1", port).hello_name("client.test");
    mailer
        .add_address("to@example.org", None, RecipientKind::To)
        .unwrap();

    let result = mailer.send("from@example.org", None, "s", "b", BodyMode::Text, None);
    assert!(result.is_err());

    // the session is torn down cleanly even after the rejection
    let captured = server.join().expect("server thread");
    assert!(captured.contains(&"QUIT".to_string()));

    // the transcript ends with the terminal outcome
    let lines: Vec<&str> = mailer.logs().iter().map(|e| e.line.as_str()).collect();
    assert!(!lines.is_empty());
    assert!(lines.contains(&"554 transaction failed"));
    assert!(lines.last().unwrap().starts_with("permanent:"));
}

#[test]
fn leading_dots_are_doubled_on_the_wire() {
    let (port, server) = spawn_server("250 queued\r\n");

    let mut mailer = Mailer::new("127.0.0.1", port).hello_name("client.test");
    mailer
        .add_address("to@example.org", None, RecipientKind::To)
        .unwrap();

    mailer
        .send(
            "from@example.org",
            None,
            "dots",
            "first line\n.Hello\nlast line",
            BodyMode::Text,
            None,
        )
        .expect("send should succeed");

    let captured = server.join().expect("server thread");
    assert!(captured.contains(&"..Hello".to_string()));
    assert!(!captured.contains(&".Hello".to_string()));
}

#[test]
fn envelope_includes_bcc_but_headers_do_not() {
    let (port, server) = spawn_server("250 queued\r\n");

    let mut mailer = Mailer::new("127.0.0.1", port).hello_name("client.test");
    mailer
        .add_address("to@example.org", None, RecipientKind::To)
        .unwrap();
    mailer
        .add_address("cc@example.org", None, RecipientKind::Cc)
        .unwrap();
    mailer
        .add_address("bcc@example.org", None, RecipientKind::Bcc)
        .unwrap();

    mailer
        .send("from@example.org", None, "s", "b", BodyMode::Text, None)
        .expect("send should succeed");

    let captured = server.join().expect("server thread");
    assert!(captured.contains(&"RCPT TO:<to@example.org>".to_string()));
    assert!(captured.contains(&"RCPT TO:<cc@example.org>".to_string()));
    assert!(captured.contains(&"RCPT TO:<bcc@example.org>".to_string()));

    let data_start = captured.iter().position(|l| l == "DATA").expect("DATA");
    let payload = &captured[data_start + 1..];
    assert!(payload.iter().any(|l| l == "To: <to@example.org>"));
    assert!(payload.iter().any(|l| l == "CC: <cc@example.org>"));
    assert!(!payload.iter().any(|l| l.contains("bcc@example.org")));
}

#[test]
fn delivery_status_adds_notify_parameter() {
    let (port, server) = spawn_server("250 queued\r\n");

    let mut mailer = Mailer::new("127.0.0.1", port).hello_name("client.test");
    mailer.enable_delivery_status();
    mailer
        .add_address("to@example.org", None, RecipientKind::To)
        .unwrap();

    mailer
        .send("from@example.org", None, "s", "b", BodyMode::Text, None)
        .expect("send should succeed");

    let captured = server.join().expect("server thread");
    assert!(captured
        .contains(&"RCPT TO:<to@example.org> NOTIFY=SUCCESS,FAILURE,DELAY".to_string()));
}

#[test]
fn connection_refused_is_reported_with_logs() {
    // port 1 on localhost is almost certainly closed; connect must fail
    // without any QUIT attempt
    let mut mailer = Mailer::new("127.0.0.1", 1);
    mailer
        .add_address("to@example.org", None, RecipientKind::To)
        .unwrap();

    let result = mailer.send("from@example.org", None, "s", "b", BodyMode::Text, None);
    assert!(result.is_err());

    let lines: Vec<&str> = mailer.logs().iter().map(|e| e.line.as_str()).collect();
    assert!(lines.iter().any(|l| l.starts_with("Connecting to ")));
    assert!(lines.iter().any(|l| l.starts_with("Connection failed:")));
}
