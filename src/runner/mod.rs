pub mod context;
pub mod events;
pub mod probe;
pub mod state;

use std::collections::BTreeMap;
use std::time::Duration;

use uuid::Uuid;

use crate::auth::acquire_credential;
use crate::client::{RequestBody, Transport};
use crate::error::CredentialError;
use crate::parser::{StepSpec, Suite};
use crate::report::types::RunReport;
use context::RunContext;
pub use events::{ConsoleListener, EventEmitter, ProbeEvent, ProbeListener};
pub use probe::{ProbeCall, ProbeOutcome, Prober};
pub use state::*;

/// Drives one suite: public probes, login, authenticated probes, report
pub struct Harness<T: Transport> {
    prober: Prober<T>,
    emitter: EventEmitter,
}

impl<T: Transport> Harness<T> {
    pub fn new(prober: Prober<T>) -> Self {
        Self {
            prober,
            emitter: EventEmitter::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn ProbeListener>) {
        self.emitter.subscribe(listener);
    }

    pub fn prober(&self) -> &Prober<T> {
        &self.prober
    }

    /// Run a suite to completion. Probe failures and login failures end up in
    /// the report; only a malformed auth response aborts with an error.
    pub fn run(&self, suite: &Suite) -> Result<RunReport, CredentialError> {
        let run_id = Uuid::new_v4().to_string();
        let mut session = ProbeSession::new(&run_id, &suite.name, self.prober.base_url());
        let mut context = RunContext::new();

        self.emitter.emit(ProbeEvent::RunStarted {
            run_id,
            suite: suite.name.clone(),
            base_url: self.prober.base_url().to_string(),
        });

        if !suite.public.is_empty() {
            self.emitter.emit(ProbeEvent::PhaseStarted {
                name: "Public probes".to_string(),
            });
            for step in &suite.public {
                self.run_step(step, None, suite, &mut context, &mut session);
            }
        }

        let mut state = HarnessState::Init;
        let next = self.authenticate(suite, &mut session)?;
        self.transition(&mut state, next);

        if let Some(credential) = state.credential() {
            context.set_var("phone", &credential.phone);
            context.set_var("code", &credential.code);
            context.set_var("token", &credential.token);
            if let Some(user_id) = &credential.user_id {
                context.set_var("user_id", user_id);
            }

            self.emitter.emit(ProbeEvent::PhaseStarted {
                name: "Authenticated probes".to_string(),
            });
            for step in &suite.steps {
                self.run_step(
                    step,
                    Some(credential.token.as_str()),
                    suite,
                    &mut context,
                    &mut session,
                );
            }
        }

        self.transition(&mut state, HarnessState::Done);
        let report = RunReport::build(session);
        self.emitter.emit(ProbeEvent::RunFinished {
            total: report.summary.total,
            passed: report.summary.passed,
        });
        Ok(report)
    }

    /// INIT -> AUTHENTICATED, or INIT -> DONE when there is nothing to log in
    /// for or the login fails.
    fn authenticate(
        &self,
        suite: &Suite,
        session: &mut ProbeSession,
    ) -> Result<HarnessState, CredentialError> {
        let login = match (&suite.login, suite.needs_login()) {
            (Some(login), true) => login,
            _ => return Ok(HarnessState::Done),
        };

        self.emitter.emit(ProbeEvent::PhaseStarted {
            name: "Credential acquisition".to_string(),
        });

        let mut login = login.clone();
        if login.timeout_ms.is_none() {
            login.timeout_ms = suite.default_timeout_ms;
        }

        let first_new = session.results.len();
        let outcome = acquire_credential(&self.prober, &login, session);
        for result in &session.results[first_new..] {
            self.emitter.emit(ProbeEvent::Probed(result.clone()));
        }

        match outcome {
            Ok(credential) => {
                self.emitter.emit(ProbeEvent::Authenticated {
                    phone: credential.phone.clone(),
                    user_id: credential.user_id.clone(),
                });
                Ok(HarnessState::Authenticated(credential))
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                log::warn!("credential acquisition failed: {}", err);
                self.emitter.emit(ProbeEvent::AuthFailed {
                    error: err.to_string(),
                });
                session.auth_error = Some(err.to_string());
                for step in &suite.steps {
                    self.skip(step, &step.path, "credential acquisition failed", session);
                }
                Ok(HarnessState::Done)
            }
        }
    }

    fn transition(&self, state: &mut HarnessState, next: HarnessState) {
        if state.name() == next.name() {
            return;
        }
        self.emitter.emit(ProbeEvent::StateChanged {
            from: state.name(),
            to: next.name(),
        });
        *state = next;
    }

    fn run_step(
        &self,
        step: &StepSpec,
        token: Option<&str>,
        suite: &Suite,
        context: &mut RunContext,
        session: &mut ProbeSession,
    ) {
        let path = context.substitute(&step.path);

        if let Some(missing) = step.requires.iter().find(|v| !context.has_var(v)) {
            let reason = format!("variable '{}' not set", missing);
            self.skip(step, &path, &reason, session);
            return;
        }

        let call = self.build_call(step, &path, token, suite, context);
        let outcome = self.prober.send(&call);

        if let (true, Some(body)) = (outcome.result.success, outcome.body.as_deref()) {
            for var in context.capture(&step.save, body) {
                log::warn!("{}: could not save '{}' from response", step.name, var);
            }
        }

        self.emitter.emit(ProbeEvent::Probed(outcome.result.clone()));
        session.record(outcome.result);
    }

    fn build_call(
        &self,
        step: &StepSpec,
        path: &str,
        token: Option<&str>,
        suite: &Suite,
        context: &RunContext,
    ) -> ProbeCall {
        let mut call = ProbeCall::new(&step.name, step.method, path);
        call.query = context.substitute_pairs(&step.query_pairs());

        call.body = match step.form_pairs() {
            Some(form) => {
                let fields: BTreeMap<String, String> =
                    context.substitute_pairs(&form).into_iter().collect();
                Some(RequestBody::Form(fields))
            }
            None => step
                .body
                .as_ref()
                .map(|b| RequestBody::Json(context.substitute_json(b))),
        };

        if step.sends_auth() {
            call.bearer = token.map(str::to_string);
        }

        call.timeout = step
            .timeout_ms
            .or(suite.default_timeout_ms)
            .map(Duration::from_millis);
        call
    }

    fn skip(&self, step: &StepSpec, path: &str, reason: &str, session: &mut ProbeSession) {
        session.skip(&step.name, path, step.method, reason);
        if let Some(skipped) = session.skipped.last() {
            self.emitter.emit(ProbeEvent::Skipped(skipped.clone()));
        }
    }
}
