use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::router::{Captures, RegistrationError};
use std::fmt;
use std::sync::Arc;

/// What every handler returns. Errors are handler-internal and propagate unchanged
/// through the dispatcher.
pub type HandlerResult = anyhow::Result<HandlerResponse>;

/// Signature of an inline route handler.
pub type HandlerFn = dyn Fn(&HandlerRequest, &Captures) -> HandlerResult + Send + Sync;

/// Shared inline callable.
#[derive(Clone)]
pub struct InlineHandler(Arc<HandlerFn>);

impl InlineHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&HandlerRequest, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, req: &HandlerRequest, args: &Captures) -> HandlerResult {
        (self.0)(req, args)
    }
}

impl fmt::Debug for InlineHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InlineHandler(..)")
    }
}

/// Registered target of a route.
#[derive(Debug, Clone)]
pub enum HandlerDescriptor {
    Inline(InlineHandler),
    Controller { controller: String, action: String },
}

impl HandlerDescriptor {
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&HandlerRequest, &Captures) -> HandlerResult + Send + Sync + 'static,
    {
        HandlerDescriptor::Inline(InlineHandler::new(f))
    }

    pub fn controller(controller: impl Into<String>, action: impl Into<String>) -> Self {
        HandlerDescriptor::Controller {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// Parse `"Controller@action"`, splitting on the first `@`.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidHandler`] when there is no `@` or either side is
    /// empty.
    pub fn parse(reference: &str) -> Result<Self, RegistrationError> {
        match reference.split_once('@') {
            Some((controller, action)) if !controller.is_empty() && !action.is_empty() => {
                Ok(Self::controller(controller, action))
            }
            _ => Err(RegistrationError::InvalidHandler(reference.to_owned())),
        }
    }
}

impl fmt::Display for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerDescriptor::Inline(_) => f.write_str("<inline>"),
            HandlerDescriptor::Controller { controller, action } => {
                write!(f, "{controller}@{action}")
            }
        }
    }
}

/// Anything a route can be registered with.
pub trait IntoHandler {
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidHandler`] for unparseable references.
    fn into_handler(self) -> Result<HandlerDescriptor, RegistrationError>;
}

impl IntoHandler for HandlerDescriptor {
    fn into_handler(self) -> Result<HandlerDescriptor, RegistrationError> {
        Ok(self)
    }
}

impl IntoHandler for InlineHandler {
    fn into_handler(self) -> Result<HandlerDescriptor, RegistrationError> {
        Ok(HandlerDescriptor::Inline(self))
    }
}

impl IntoHandler for &str {
    fn into_handler(self) -> Result<HandlerDescriptor, RegistrationError> {
        HandlerDescriptor::parse(self)
    }
}

impl IntoHandler for String {
    fn into_handler(self) -> Result<HandlerDescriptor, RegistrationError> {
        HandlerDescriptor::parse(&self)
    }
}

impl IntoHandler for (&str, &str) {
    fn into_handler(self) -> Result<HandlerDescriptor, RegistrationError> {
        let (controller, action) = self;
        if controller.is_empty() || action.is_empty() {
            return Err(RegistrationError::InvalidHandler(format!("{controller}@{action}")));
        }
        Ok(HandlerDescriptor::controller(controller, action))
    }
}

/// A controller instance built fresh for each dispatched request.
///
/// Implementations map action names onto their own methods. Returning `None`
/// means the action does not exist on this controller; the dispatcher reports
/// that as a server error without running anything.
///
/// ```rust
/// use blogrouter::dispatcher::{HandlerRequest, HandlerResponse};
/// use blogrouter::handlers::{Controller, HandlerResult};
/// use blogrouter::router::Captures;
///
/// struct Hello;
///
/// impl Controller for Hello {
///     fn invoke(&mut self, action: &str, _req: &HandlerRequest, args: &Captures) -> Option<HandlerResult> {
///         match action {
///             "greet" => Some(args.arg(0).map(|n| HandlerResponse::text(200, format!("hi {n}")))),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Controller {
    fn invoke(
        &mut self,
        action: &str,
        req: &HandlerRequest,
        args: &Captures,
    ) -> Option<HandlerResult>;
}
