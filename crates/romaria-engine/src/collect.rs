//! Tolerant parsing of free-text `key: value` participant data.
//!
//! Inbound collection messages look like:
//!
//! ```text
//! nome: Alice Souza
//! cpf: 529.982.247-25
//! nascimento: 14/05/1999
//! sexo: F
//! distrito: Planaltina
//! ```
//!
//! Lines that don't split on `:` and keys outside the alias table are
//! skipped, never rejected — the "could not parse" path is a re-prompt,
//! decided by the flow engine once it sees what is still missing.

use romaria_core::{
  registration::ParticipantDraft,
  validate::{cpf_digits, normalize_date, normalize_phone},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Name,
  Cpf,
  Birthdate,
  Gender,
  Phone,
  District,
  Church,
}

/// Accepted spellings for each field, lowercased, accents included where
/// users actually type them.
const ALIASES: &[(&str, Field)] = &[
  ("nome", Field::Name),
  ("nome completo", Field::Name),
  ("name", Field::Name),
  ("cpf", Field::Cpf),
  ("documento", Field::Cpf),
  ("nascimento", Field::Birthdate),
  ("data de nascimento", Field::Birthdate),
  ("data nascimento", Field::Birthdate),
  ("aniversario", Field::Birthdate),
  ("aniversário", Field::Birthdate),
  ("sexo", Field::Gender),
  ("genero", Field::Gender),
  ("gênero", Field::Gender),
  ("telefone", Field::Phone),
  ("celular", Field::Phone),
  ("fone", Field::Phone),
  ("whatsapp", Field::Phone),
  ("distrito", Field::District),
  ("igreja", Field::Church),
];

fn field_for(key: &str) -> Option<Field> {
  let key = key.trim().trim_start_matches('*').trim().to_lowercase();
  ALIASES
    .iter()
    .find(|(alias, _)| *alias == key)
    .map(|(_, field)| *field)
}

/// Parse one message into a draft. Unrecognised lines are ignored; values
/// are normalized on the way in (CPF to bare digits, dates to `NaiveDate`,
/// phones to the canonical digits form).
pub fn parse_draft(text: &str) -> ParticipantDraft {
  let mut draft = ParticipantDraft::default();

  for line in text.lines() {
    let Some((key, value)) = line.split_once(':') else {
      continue;
    };
    let value = value.trim();
    if value.is_empty() {
      continue;
    }
    match field_for(key) {
      Some(Field::Name) => draft.name = Some(value.to_string()),
      Some(Field::Cpf) => draft.cpf = cpf_digits(value),
      Some(Field::Birthdate) => draft.birthdate = normalize_date(value),
      Some(Field::Gender) => draft.gender = Some(value.to_uppercase()),
      Some(Field::Phone) => draft.phone = Some(normalize_phone(value)),
      Some(Field::District) => draft.district_name = Some(value.to_string()),
      Some(Field::Church) => draft.church_name = Some(value.to_string()),
      None => {}
    }
  }

  draft
}

/// Overlay `update` on `base`: fields present in the newer message win,
/// everything already collected survives. Lets a user answer a re-prompt
/// with only the missing lines.
pub fn merge(base: ParticipantDraft, update: ParticipantDraft) -> ParticipantDraft {
  ParticipantDraft {
    name:          update.name.or(base.name),
    cpf:           update.cpf.or(base.cpf),
    birthdate:     update.birthdate.or(base.birthdate),
    gender:        update.gender.or(base.gender),
    phone:         update.phone.or(base.phone),
    district_name: update.district_name.or(base.district_name),
    church_name:   update.church_name.or(base.church_name),
    district_id:   update.district_id.or(base.district_id),
    church_id:     update.church_id.or(base.church_id),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;

  #[test]
  fn parses_a_full_record() {
    let draft = parse_draft(
      "nome: Alice Souza\n\
       CPF: 529.982.247-25\n\
       nascimento: 14/05/1999\n\
       sexo: f\n\
       celular: (61) 99988-7766\n\
       distrito: Planaltina\n\
       igreja: Central",
    );

    assert_eq!(draft.name.as_deref(), Some("Alice Souza"));
    assert_eq!(draft.cpf.as_deref(), Some("52998224725"));
    assert_eq!(draft.birthdate, NaiveDate::from_ymd_opt(1999, 5, 14));
    assert_eq!(draft.gender.as_deref(), Some("F"));
    assert_eq!(draft.phone.as_deref(), Some("5561999887766"));
    assert_eq!(draft.district_name.as_deref(), Some("Planaltina"));
    assert_eq!(draft.church_name.as_deref(), Some("Central"));
  }

  #[test]
  fn aliases_map_to_the_same_field() {
    let a = parse_draft("nome completo: Alice");
    let b = parse_draft("Nome: Alice");
    assert_eq!(a.name, b.name);

    let c = parse_draft("data de nascimento: 1999-05-14");
    assert_eq!(c.birthdate, NaiveDate::from_ymd_opt(1999, 5, 14));
  }

  #[test]
  fn junk_lines_are_skipped_not_fatal() {
    let draft = parse_draft("ola bot\nnome: Alice\nisso nao e um campo\n???");
    assert_eq!(draft.name.as_deref(), Some("Alice"));
    assert!(draft.cpf.is_none());
  }

  #[test]
  fn unparsable_date_yields_none() {
    let draft = parse_draft("nome: Alice\nnascimento: sei la");
    assert!(draft.birthdate.is_none());
  }

  #[test]
  fn wrong_length_cpf_yields_none() {
    let draft = parse_draft("cpf: 12345");
    assert!(draft.cpf.is_none());
  }

  #[test]
  fn merge_keeps_old_fields_and_takes_new_ones() {
    let base = parse_draft("nome: Alice Souza");
    let update = parse_draft("cpf: 52998224725");
    let merged = merge(base, update);
    assert_eq!(merged.name.as_deref(), Some("Alice Souza"));
    assert_eq!(merged.cpf.as_deref(), Some("52998224725"));
    assert!(merged.is_complete());
  }
}
