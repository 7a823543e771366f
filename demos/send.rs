use smtp_mailer::{BodyMode, Credentials, Mailer, Mechanism, RecipientKind};

fn main() {
    env_logger::init();

    let mut mailer = Mailer::new("tls://smtp.gmail.com", 587).credentials(
        Credentials::new(
            "example_username".to_string(),
            "example_password".to_string(),
        ),
        Mechanism::Login,
    );
    if let Err(err) = mailer.add_address("user@example.org", Some("User"), RecipientKind::To) {
        println!("Bad recipient: {:?}", err);
        return;
    }

    let result = mailer.send(
        "user@localhost",
        Some("Sender"),
        "Hello",
        "Hi, Hello world.",
        BodyMode::Text,
        None,
    );

    match result {
        Ok(response) => println!("Email sent: {:?}", response),
        Err(err) => println!("Could not send email: {:?}", err),
    }

    for entry in mailer.logs() {
        println!("{}", entry);
    }
}
