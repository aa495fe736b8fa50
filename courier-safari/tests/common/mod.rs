#![allow(dead_code)]

use courier_safari::{ICON_NAMES, SafariOptions, SigningMaterial, WebsiteDescriptor};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509NameBuilder};
use tempfile::TempDir;

pub fn self_signed(common_name: &str) -> (X509, PKey<Private>) {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();

    (builder.build(), pkey)
}

pub fn pkcs12(cert: &X509, pkey: &PKey<Private>) -> Vec<u8> {
    Pkcs12::builder()
        .name("web.com.example")
        .pkey(pkey)
        .cert(cert)
        .build2("")
        .unwrap()
        .to_der()
        .unwrap()
}

pub fn descriptor() -> WebsiteDescriptor {
    WebsiteDescriptor {
        website_name: "Example".into(),
        website_push_id: "web.com.example".into(),
        allowed_domains: vec!["https://example.com".into()],
        url_format_string: "https://example.com/%@".into(),
        authentication_token: "secret123".into(),
        web_service_url: "https://example.com/push".into(),
    }
}

/// Icons, signing bundle and Apple root on disk.
pub struct Fixture {
    pub dir: TempDir,
    pub signer: X509,
    pub root: X509,
    pub options: SafariOptions,
}

pub fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();

    let icons = dir.path().join("icons");
    std::fs::create_dir(&icons).unwrap();
    for name in ICON_NAMES {
        std::fs::write(icons.join(name), format!("png:{}", name)).unwrap();
    }

    let (signer, key) = self_signed("Website Push ID: web.com.example");
    let (root, _) = self_signed("Apple Root CA");
    let root_path = dir.path().join("AppleRootCA.cer");
    std::fs::write(&root_path, root.to_der().unwrap()).unwrap();

    let signing = SigningMaterial::new(pkcs12(&signer, &key), root_path);
    let options = SafariOptions::new(descriptor(), signing, icons);

    Fixture {
        dir,
        signer,
        root,
        options,
    }
}
