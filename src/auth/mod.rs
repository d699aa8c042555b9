//! Phone + one-time-code login.
//!
//! Two calls: send-code returns the code (development backends echo it in
//! `data`), login-with-code exchanges phone and code for a bearer token. Both
//! calls are recorded in the session like any other probe.

pub mod envelope;
pub mod jwt;

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use crate::client::{Method, Transport};
use crate::error::CredentialError;
use crate::parser::LoginSpec;
use crate::runner::probe::{ProbeCall, ProbeOutcome, Prober};
use crate::runner::state::ProbeSession;
use envelope::{ApiEnvelope, LoginData};

/// Identity obtained from the login flow
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub phone: String,
    pub code: String,
    pub token: String,
    pub user_id: Option<String>,
}

pub fn acquire_credential<T: Transport>(
    prober: &Prober<T>,
    login: &LoginSpec,
    session: &mut ProbeSession,
) -> Result<Credential, CredentialError> {
    let timeout = login.timeout_ms.map(Duration::from_millis);

    // 1. Request a code
    let mut call = ProbeCall::new("send code", Method::Post, &login.send_code_path)
        .query("phone", &login.phone);
    call.timeout = timeout;
    let (status, body) = checked_send(prober, &call, session)?;

    let envelope: ApiEnvelope<Value> = decode(&login.send_code_path, &body)?;
    ensure_success(&login.send_code_path, status, &envelope)?;

    let code = envelope
        .data
        .as_ref()
        .and_then(extract_code)
        .or_else(|| login.code.clone())
        .ok_or_else(|| CredentialError::Malformed {
            endpoint: login.send_code_path.clone(),
            reason: "no verification code in response".to_string(),
        })?;
    log::debug!("verification code for {}: {}", login.phone, code);

    // 2. Exchange phone + code for a token
    let mut call = ProbeCall::new("login with code", Method::Post, &login.login_path)
        .query("phone", &login.phone)
        .query("code", &code);
    for (key, value) in login.param_pairs() {
        call.query.push((key, value));
    }
    call.timeout = timeout;
    let (status, body) = checked_send(prober, &call, session)?;

    let envelope: ApiEnvelope<LoginData> = decode(&login.login_path, &body)?;
    ensure_success(&login.login_path, status, &envelope)?;

    let data = envelope.data.unwrap_or_default();
    let token = data
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CredentialError::Malformed {
            endpoint: login.login_path.clone(),
            reason: "no token in login response".to_string(),
        })?;
    let user_id = data.user.as_ref().and_then(|u| u.id_string());

    log::info!(
        "logged in as {} (user id {})",
        login.phone,
        user_id.as_deref().unwrap_or("unknown")
    );
    if let Ok(claims) = jwt::decode_claims(&token) {
        log::debug!("token claims: {}", Value::Object(claims.claims));
    }

    Ok(Credential {
        phone: login.phone.clone(),
        code,
        token,
        user_id,
    })
}

/// Send, record, and turn transport or HTTP failures into credential errors.
/// Returns status and full response body on 2xx.
fn checked_send<T: Transport>(
    prober: &Prober<T>,
    call: &ProbeCall,
    session: &mut ProbeSession,
) -> Result<(u16, String), CredentialError> {
    let ProbeOutcome { result, body } = prober.send(call);
    session.record(result.clone());

    let body = match body {
        Some(body) => body,
        None => {
            return Err(CredentialError::Network {
                endpoint: call.path.clone(),
                message: result.error.unwrap_or_default(),
            })
        }
    };

    if !result.success {
        let message = ApiEnvelope::<Value>::decode(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| result.response.clone());
        return Err(CredentialError::Rejected {
            endpoint: call.path.clone(),
            status: result.status_code,
            message,
        });
    }

    Ok((result.status_code, body))
}

fn decode<D: serde::de::DeserializeOwned>(
    endpoint: &str,
    body: &str,
) -> Result<ApiEnvelope<D>, CredentialError> {
    ApiEnvelope::decode(body).map_err(|e| CredentialError::Malformed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

fn ensure_success<D>(
    endpoint: &str,
    status: u16,
    envelope: &ApiEnvelope<D>,
) -> Result<(), CredentialError> {
    if envelope.success {
        return Ok(());
    }
    Err(CredentialError::Rejected {
        endpoint: endpoint.to_string(),
        status,
        message: envelope
            .message
            .clone()
            .unwrap_or_else(|| "success=false".to_string()),
    })
}

fn code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{4,8})(?:\D|$)").expect("code pattern"))
}

/// Pull a 4-8 digit verification code out of a send-code `data` value
pub fn extract_code(data: &Value) -> Option<String> {
    match data {
        Value::String(s) => code_pattern()
            .captures(s)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        Value::Number(n) => n
            .as_u64()
            .map(|v| v.to_string())
            .filter(|code| (4..=8).contains(&code.len())),
        Value::Object(map) => map.get("code").and_then(extract_code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ScriptedTransport;
    use crate::error::TransportError;
    use serde_json::json;

    const SEND: &str = "/api/auth/send-code";
    const LOGIN: &str = "/api/auth/login-with-code";

    fn session() -> ProbeSession {
        ProbeSession::new("run", "test", "http://h")
    }

    #[test]
    fn test_extract_code() {
        assert_eq!(extract_code(&json!("654321")).as_deref(), Some("654321"));
        assert_eq!(extract_code(&json!("code: 1234, valid 5 min")).as_deref(), Some("1234"));
        assert_eq!(extract_code(&json!(123456)).as_deref(), Some("123456"));
        assert_eq!(extract_code(&json!(123)), None);
        assert_eq!(extract_code(&json!(12345678901u64)), None);
        assert_eq!(extract_code(&json!({"code": "009931"})).as_deref(), Some("009931"));
        assert_eq!(extract_code(&json!("sent")), None);
        assert_eq!(extract_code(&json!("12345678901")), None);
        assert_eq!(extract_code(&Value::Null), None);
    }

    #[test]
    fn test_successful_login_records_two_probes() {
        let transport = ScriptedTransport::new()
            .route(Method::Post, SEND, 200, r#"{"success":true,"data":"654321"}"#)
            .route(
                Method::Post,
                LOGIN,
                200,
                r#"{"success":true,"data":{"token":"abc","user":{"id":1}}}"#,
            );
        let prober = Prober::new(transport, "http://h");
        let mut session = session();

        let credential =
            acquire_credential(&prober, &LoginSpec::new("13800138000"), &mut session).unwrap();

        assert_eq!(credential.token, "abc");
        assert_eq!(credential.code, "654321");
        assert_eq!(credential.user_id.as_deref(), Some("1"));
        assert_eq!(session.results.len(), 2);
        assert!(session.results.iter().all(|r| r.success));

        let sent = prober.transport().sent();
        assert_eq!(sent[1].query_value("phone"), Some("13800138000"));
        assert_eq!(sent[1].query_value("code"), Some("654321"));
    }

    #[test]
    fn test_login_params_are_forwarded() {
        let transport = ScriptedTransport::new()
            .route(Method::Post, SEND, 200, r#"{"success":true,"data":"1111"}"#)
            .route(Method::Post, LOGIN, 200, r#"{"success":true,"data":{"token":"t"}}"#);
        let prober = Prober::new(transport, "http://h");
        let mut login = LoginSpec::new("1");
        login.params.insert("gender".to_string(), json!("FEMALE"));

        let credential = acquire_credential(&prober, &login, &mut session()).unwrap();

        assert_eq!(credential.user_id, None);
        assert_eq!(prober.transport().sent()[1].query_value("gender"), Some("FEMALE"));
    }

    #[test]
    fn test_send_code_refused_is_network_error() {
        let transport = ScriptedTransport::new().fail(
            Method::Post,
            SEND,
            TransportError::Connect("connection refused".to_string()),
        );
        let prober = Prober::new(transport, "http://h");
        let mut session = session();

        let err = acquire_credential(&prober, &LoginSpec::new("1"), &mut session).unwrap_err();

        assert!(matches!(err, CredentialError::Network { .. }));
        assert!(!err.is_fatal());
        assert_eq!(session.results.len(), 1);
        assert_eq!(session.results[0].status_code, 0);
    }

    #[test]
    fn test_success_false_is_rejected() {
        let transport = ScriptedTransport::new().route(
            Method::Post,
            SEND,
            200,
            r#"{"success":false,"message":"too many requests"}"#,
        );
        let prober = Prober::new(transport, "http://h");

        let err = acquire_credential(&prober, &LoginSpec::new("1"), &mut session()).unwrap_err();

        assert_eq!(
            err,
            CredentialError::Rejected {
                endpoint: SEND.to_string(),
                status: 200,
                message: "too many requests".to_string(),
            }
        );
    }

    #[test]
    fn test_login_http_error_is_rejected() {
        let transport = ScriptedTransport::new()
            .route(Method::Post, SEND, 200, r#"{"success":true,"data":"654321"}"#)
            .route(Method::Post, LOGIN, 400, r#"{"success":false,"message":"bad code"}"#);
        let prober = Prober::new(transport, "http://h");
        let mut session = session();

        let err = acquire_credential(&prober, &LoginSpec::new("1"), &mut session).unwrap_err();

        assert!(matches!(err, CredentialError::Rejected { status: 400, .. }));
        assert_eq!(session.results.len(), 2);
        assert!(!session.results[1].success);
    }

    #[test]
    fn test_fixed_code_fallback() {
        let transport = ScriptedTransport::new()
            .route(Method::Post, SEND, 200, r#"{"success":true,"message":"sent"}"#)
            .route(Method::Post, LOGIN, 200, r#"{"success":true,"data":{"token":"t"}}"#);
        let prober = Prober::new(transport, "http://h");
        let mut login = LoginSpec::new("1");
        login.code = Some("123456".to_string());

        let credential = acquire_credential(&prober, &login, &mut session()).unwrap();

        assert_eq!(credential.code, "123456");
    }

    #[test]
    fn test_malformed_responses_are_fatal() {
        let transport = ScriptedTransport::new().route(Method::Post, SEND, 200, "<html>ok</html>");
        let prober = Prober::new(transport, "http://h");
        let err = acquire_credential(&prober, &LoginSpec::new("1"), &mut session()).unwrap_err();
        assert!(err.is_fatal());

        let transport = ScriptedTransport::new()
            .route(Method::Post, SEND, 200, r#"{"success":true,"data":"654321"}"#)
            .route(Method::Post, LOGIN, 200, r#"{"success":true,"data":{"user":{"id":1}}}"#);
        let prober = Prober::new(transport, "http://h");
        let err = acquire_credential(&prober, &LoginSpec::new("1"), &mut session()).unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }
}
