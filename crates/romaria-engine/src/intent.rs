//! Inbound-text intent classification.
//!
//! Evaluated in fixed priority order, independent of the session state:
//! cancel keywords, then support keywords, then payment shortcuts, and only
//! then the state-scoped interpretation of [`crate::flow`].

use romaria_core::validate::{cpf_digits, valid_cpf};

/// What a payment-shortcut message wants done with the most recent pending
/// payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
  /// Resend the copyable PIX token.
  CopyCode,
  /// Resend the QR image.
  ResendQr,
  /// The user claims the charge was settled; re-check with the gateway.
  ClaimPaid,
  /// Consult whether a pending charge exists.
  ConsultPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
  /// Hard reset to idle.
  Cancel,
  /// Static contact info; no state change.
  Support,
  /// Bypasses the registration flow entirely. `cpf` is set when the message
  /// carries a valid CPF inline.
  Payment { action: PaymentAction, cpf: Option<String> },
  /// Everything else — interpreted by the current state's handler.
  StateInput,
}

const CANCEL_WORDS: &[&str] = &["cancelar", "cancela", "sair", "parar", "encerrar", "desistir"];

const SUPPORT_WORDS: &[&str] = &["suporte", "ajuda", "atendente", "atendimento", "falar"];

const COPY_CODE_WORDS: &[&str] = &["pix", "copia", "copiar", "codigo", "código"];

const QR_WORDS: &[&str] = &["qr", "qrcode"];

const PAID_PHRASES: &[&str] = &["ja paguei", "já paguei", "paguei", "pagamento feito"];

const PENDING_PHRASES: &[&str] =
  &["segunda via", "2 via", "2a via", "pagamento pendente", "pendente", "cobranca", "cobrança"];

/// Classify a raw inbound message. Keyword checks are case-insensitive and
/// whole-word; phrase checks are substring on the lowercased text.
pub fn classify(text: &str) -> Intent {
  let lowered = text.trim().to_lowercase();

  if has_word(&lowered, CANCEL_WORDS) {
    return Intent::Cancel;
  }
  if has_word(&lowered, SUPPORT_WORDS) {
    return Intent::Support;
  }

  let cpf = extract_cpf(&lowered);
  if has_phrase(&lowered, PAID_PHRASES) {
    return Intent::Payment { action: PaymentAction::ClaimPaid, cpf };
  }
  if has_word(&lowered, QR_WORDS) {
    return Intent::Payment { action: PaymentAction::ResendQr, cpf };
  }
  if has_phrase(&lowered, PENDING_PHRASES) {
    return Intent::Payment { action: PaymentAction::ConsultPending, cpf };
  }
  if has_word(&lowered, COPY_CODE_WORDS) || has_phrase(&lowered, &["copia e cola"]) {
    return Intent::Payment { action: PaymentAction::CopyCode, cpf };
  }

  Intent::StateInput
}

/// Find the first token in the message that is a valid 11-digit CPF.
pub fn extract_cpf(text: &str) -> Option<String> {
  text
    .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
    .filter_map(cpf_digits)
    .find(|digits| valid_cpf(digits))
}

fn has_word(lowered: &str, words: &[&str]) -> bool {
  lowered
    .split(|c: char| !c.is_alphanumeric())
    .any(|token| words.contains(&token))
}

fn has_phrase(lowered: &str, phrases: &[&str]) -> bool {
  phrases.iter().any(|p| lowered.contains(p))
}
