//! Receipt rendering.
//!
//! A paid registration gets a self-contained HTML receipt uploaded to blob
//! storage under a name derived from the registration id, so a repeated
//! webhook overwrites the same object instead of producing a second one.

use sha2::{Digest, Sha256};

use romaria_core::registration::{Participant, Registration};

/// The blob name for a registration's receipt. Stable across retries.
pub fn blob_name(registration: &Registration) -> String {
  format!("receipts/{}.html", registration.id)
}

/// Render the receipt document. The embedded content hash lets a reader
/// verify the document was not edited after issuance.
pub fn render(
  event_name:   &str,
  registration: &Registration,
  participants: &[Participant],
) -> String {
  let mut rows = String::new();
  for p in participants {
    rows.push_str(&format!(
      "      <tr><td>{}</td><td>{}</td></tr>\n",
      escape(&p.name),
      mask_cpf(&p.cpf)
    ));
  }

  let body = format!(
    "<h1>Comprovante de inscrição</h1>\n\
     <p><strong>Evento:</strong> {}</p>\n\
     <p><strong>Inscrição:</strong> {}</p>\n\
     <p><strong>Valor:</strong> R$ {}</p>\n\
     <p><strong>Data:</strong> {}</p>\n\
     <table>\n\
     \x20     <tr><th>Participante</th><th>CPF</th></tr>\n{rows}    </table>",
    escape(event_name),
    registration.id,
    registration.total,
    registration.created_at.format("%d/%m/%Y %H:%M UTC"),
  );

  let mut hasher = Sha256::new();
  hasher.update(body.as_bytes());
  let digest = hex::encode(hasher.finalize());

  format!(
    "<!DOCTYPE html>\n\
     <html lang=\"pt-BR\">\n\
     <head><meta charset=\"utf-8\"><title>Comprovante</title></head>\n\
     <body>\n{body}\n\
     <p><small>Verificação: {digest}</small></p>\n\
     </body>\n\
     </html>\n"
  )
}

/// Only the last four CPF digits appear on the receipt. The store does not
/// enforce CPF length, so anything shorter than four digits is shown as-is
/// behind the mask.
fn mask_cpf(cpf: &str) -> String {
  let tail = &cpf[cpf.len().saturating_sub(4)..];
  if tail.len() < 4 {
    return format!("***{tail}");
  }
  format!("***.***.*{}-{}", &tail[..2], &tail[2..])
}

fn escape(text: &str) -> String {
  text
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}
