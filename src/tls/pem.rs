//! PEM material loading for the trust builder.

use std::io;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::error::TrustError;

/// Read a whole file through a capability on its parent directory.
pub(super) fn read_file(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "path does not contain a filename",
        )
    })?;

    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read(file_name)
}

/// Every `CERTIFICATE` block in `pem`; malformed blocks are skipped.
pub(super) fn parse_ca_certificates(pem: &[u8]) -> Vec<CertificateDer<'static>> {
    CertificateDer::pem_slice_iter(pem)
        .filter_map(Result::ok)
        .collect()
}

/// Load a client certificate chain and its private key.
pub(super) fn load_identity(
    cert_path: &Utf8Path,
    key_path: &Utf8Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TrustError> {
    let key_pair_error = |message: String| TrustError::KeyPair {
        cert_path: cert_path.to_owned(),
        key_path: key_path.to_owned(),
        message,
    };

    let cert_pem = read_file(cert_path)
        .map_err(|error| key_pair_error(format!("failed to read certificate: {error}")))?;
    let chain = CertificateDer::pem_slice_iter(&cert_pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| key_pair_error(format!("invalid certificate PEM: {error}")))?;
    if chain.is_empty() {
        return Err(key_pair_error(String::from(
            "no certificate found in certificate file",
        )));
    }

    let key_pem = read_file(key_path)
        .map_err(|error| key_pair_error(format!("failed to read private key: {error}")))?;
    let key = PrivateKeyDer::from_pem_slice(&key_pem)
        .map_err(|error| key_pair_error(format!("invalid private key PEM: {error}")))?;

    Ok((chain, key))
}
