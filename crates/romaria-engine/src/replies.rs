//! All user-facing message copy, in one place.

use romaria_core::{
  event::Event,
  gateway::MenuOption,
  payment::Payment,
  registration::{Registration, RegistrationStatus},
  session::ListedOption,
};

pub const SUPPORT_CONTACT: &str =
  "Para falar com a equipe de suporte, chame (61) 3333-0000 ou escreva para \
   secretaria@romaria.org. Atendemos de segunda a sexta, das 9h às 18h.";

pub const CANCELLED: &str =
  "Tudo bem, cancelei o que estávamos fazendo. Quando quiser recomeçar é só \
   mandar uma mensagem.";

pub const MENU_HEADER: &str =
  "Olá! Sou o assistente de inscrições. O que você precisa?";

pub fn menu_options() -> Vec<MenuOption> {
  vec![
    MenuOption::new("register", "1. Fazer inscrição"),
    MenuOption::new("consult", "2. Consultar minha inscrição"),
    MenuOption::new("pending", "3. Pagamento pendente"),
    MenuOption::new("support", "4. Falar com o suporte"),
  ]
}

pub const MENU_RETRY: &str = "Não entendi. Responda com o número de uma das opções (1 a 4).";

pub const NO_OPEN_EVENTS: &str =
  "No momento não há eventos com inscrições abertas. Volte em breve!";

pub const EVENT_LIST_HEADER: &str = "Esses são os eventos abertos. Qual você quer?";

pub const EVENT_RETRY: &str = "Responda com o número do evento da lista.";

pub fn ask_quantity(event_name: &str) -> String {
  format!("Inscrição para *{event_name}*. Quantas pessoas você vai inscrever? (1 a 50)")
}

pub const QUANTITY_RETRY: &str = "Preciso de um número entre 1 e 50.";

pub fn ask_participant(index: u32, quantity: u32) -> String {
  format!(
    "Me envie os dados do participante {index} de {quantity}, uma linha por campo:\n\n\
     nome: \n\
     cpf: \n\
     nascimento: \n\
     sexo: \n\
     telefone: \n\
     distrito: \n\
     igreja: "
  )
}

pub const PARTICIPANT_RETRY: &str =
  "Ainda faltam dados ou o CPF não é válido. Confira e envie novamente — \
   preciso pelo menos de *nome* e *cpf* (com os 11 dígitos corretos).";

pub fn duplicate_participant(cpf: &str, index: u32) -> String {
  let tail = &cpf[cpf.len().saturating_sub(4)..];
  format!(
    "O CPF terminado em {tail} já está inscrito neste evento, então pulei o \
     participante {index}. Se isso for um engano, fale com o suporte."
  )
}

pub const DISTRICT_HEADER: &str =
  "De qual distrito é esse participante? Responda com o número, ou 0 se não estiver na lista.";

pub const CHURCH_HEADER: &str =
  "E de qual igreja? Responda com o número, ou 0 se não estiver na lista.";

pub fn numbered_options(options: &[ListedOption]) -> Vec<MenuOption> {
  options
    .iter()
    .enumerate()
    .map(|(i, o)| MenuOption::new(o.id.to_string(), format!("{}. {}", i + 1, o.label)))
    .collect()
}

pub const LIST_RETRY: &str = "Responda só com o número da lista (ou 0 para nenhum).";

pub const ASK_CPF: &str = "Me informe o CPF (somente números ou no formato 000.000.000-00).";

pub const CPF_RETRY: &str = "Esse CPF não parece válido. Confira os 11 dígitos e envie de novo.";

pub fn pix_issued(registration: &Registration, payment: &Payment) -> String {
  format!(
    "Inscrição registrada! Total: R$ {}.\n\n\
     Pague com o PIX copia-e-cola abaixo:\n\n{}\n\n\
     Assim que o pagamento for confirmado você recebe o comprovante por aqui.",
    registration.total, payment.pix_code
  )
}

pub fn after_pix_options() -> Vec<MenuOption> {
  vec![
    MenuOption::new("copy", "1. Reenviar código PIX"),
    MenuOption::new("paid", "2. Já paguei"),
    MenuOption::new("support", "3. Falar com o suporte"),
  ]
}

pub const AFTER_PIX_HEADER: &str = "Se precisar, é só escolher:";

pub const SETTLEMENT_FAILED: &str =
  "Registrei seus dados, mas não consegui gerar a cobrança agora. \
   Nossa equipe vai te chamar para concluir o pagamento — ou fale com o \
   suporte se preferir.";

pub const ALL_DUPLICATES: &str =
  "Todos os participantes informados já estão inscritos neste evento, então \
   não gerei uma nova cobrança.";

pub const NO_ACTIVE_TIER: &str =
  "As inscrições para esse evento estão fora do período de pagamento. \
   Fale com o suporte para verificar os prazos.";

pub fn pending_payment(payment: &Payment) -> String {
  format!(
    "Encontrei um pagamento pendente. PIX copia-e-cola:\n\n{}",
    payment.pix_code
  )
}

pub const NO_PENDING_PAYMENT: &str =
  "Não encontrei nenhum pagamento pendente para esse CPF. Se você acabou de \
   pagar, a confirmação pode levar alguns minutos.";

pub const CLAIM_CONFIRMED: &str =
  "Pagamento confirmado pelo provedor! O comprovante chega por aqui em instantes.";

pub const CLAIM_NOT_FOUND: &str =
  "O provedor ainda não confirmou esse pagamento. Se você acabou de pagar, \
   aguarde alguns minutos e tente de novo.";

pub fn registration_summary(registration: &Registration, event: Option<&Event>) -> String {
  let event_name = event.map(|e| e.name.as_str()).unwrap_or("evento");
  let status = match registration.status {
    RegistrationStatus::Paid => "pago",
    RegistrationStatus::Pending => "aguardando pagamento",
  };
  format!(
    "• {event_name}: R$ {} — {status} (em {})",
    registration.total,
    registration.created_at.format("%d/%m/%Y")
  )
}

pub const NO_REGISTRATION_FOUND: &str =
  "Não encontrei nenhuma inscrição para esse CPF.";

pub fn receipt_ready(link: &str) -> String {
  format!("Pagamento confirmado! Seu comprovante: {link}")
}
