//! The login form and where to send it.

use crate::credentials::login_name;

/// Form field carrying the secret.
pub const FIELD_PASSWORD: &str = "password";
/// Form field carrying the login name, stealth marker included.
pub const FIELD_LOGIN_NAME: &str = "loginname";

/// One login submission: the endpoint path, the url-encoded form fields in
/// submission order, and which server to route it to.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    /// The endpoint path, relative to the server's base URL.
    pub path: String,

    /// Form fields, submitted in this order.
    pub fields: Vec<(String, String)>,

    /// Send to the alternate server instead of the default one.
    pub use_alternate_server: bool,
}

impl LoginRequest {
    /// Builds the standard login form.
    ///
    /// ```
    /// use timein::metadata::LoginRequest;
    ///
    /// let request = LoginRequest::login("login.php", "wizard", "x", true);
    /// assert_eq!(request.field("loginname"), Some("wizard/q"));
    /// assert_eq!(request.field("loggingin"), Some("Yup."));
    /// ```
    pub fn login(path: impl Into<String>, identity: &str, secret: &str, stealthy: bool) -> Self {
        Self::new(path)
            .with_field(FIELD_PASSWORD, secret)
            .with_field("secure", "0")
            .with_field(FIELD_LOGIN_NAME, login_name(identity, stealthy))
            .with_field("loggingin", "Yup.")
    }

    /// Creates an empty form for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: Vec::new(),
            use_alternate_server: false,
        }
    }

    /// Appends a form field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn with_alternate_server(mut self, use_alternate_server: bool) -> Self {
        self.use_alternate_server = use_alternate_server;
        self
    }

    /// Returns the first value submitted for `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(key, value)| {
                if key == FIELD_PASSWORD {
                    (key.as_str(), "<redacted>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("LoginRequest")
            .field("path", &self.path)
            .field("fields", &fields)
            .field("use_alternate_server", &self.use_alternate_server)
            .finish()
    }
}
