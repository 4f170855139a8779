//! Small helpers shared by the handlers.

/// Name shown on the home screen: the local part of the e-mail.
pub fn display_name(email: &str) -> String {
  match email.split('@').next().map(str::trim) {
    Some(name) if !name.is_empty() => name.to_string(),
    _ => "Coder".into(),
  }
}

/// A submission counts only when the user actually changed the starter code.
pub fn is_meaningful_submission(code: &str, starter_code: &str) -> bool {
  let code = code.trim();
  !code.is_empty() && code != starter_code.trim()
}

/// Log-safe truncation for large strings (user code, response bodies).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_name_uses_local_part() {
    assert_eq!(display_name("ada@example.com"), "ada");
    assert_eq!(display_name("no-at-sign"), "no-at-sign");
    assert_eq!(display_name(""), "Coder");
    assert_eq!(display_name("@example.com"), "Coder");
  }

  #[test]
  fn starter_code_and_blank_are_rejected() {
    let starter = "fn solve() {\n    // Your code here\n}";
    assert!(!is_meaningful_submission("   \n", starter));
    assert!(!is_meaningful_submission(&format!("  {starter}\n\n"), starter));
    assert!(is_meaningful_submission("fn solve() { 42 }", starter));
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let out = trunc_for_log("ééééé", 3);
    assert!(out.starts_with('é'));
    assert!(out.ends_with("(10 bytes total)"));
  }
}
