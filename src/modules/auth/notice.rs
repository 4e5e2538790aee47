use crate::DEFAULT_LOGIN_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// Recovery action offered alongside a notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeAction {
    pub label: String,
    pub navigate_to: String,
}

impl NoticeAction {
    pub fn sign_in() -> Self {
        Self {
            label: "Sign In".to_string(),
            navigate_to: DEFAULT_LOGIN_PATH.to_string(),
        }
    }
}

/// Transient, dismissable message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub action: Option<NoticeAction>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: NoticeAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Outbox drained by whatever presents notices
#[derive(Debug, Default)]
pub struct Notices {
    pending: Vec<Notice>,
}

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        self.pending.push(notice);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Success, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Error, message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Notice::new(NoticeLevel::Warning, message));
    }

    pub fn peek(&self) -> &[Notice] {
        &self.pending
    }

    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }
}

/// Form field that can carry an inline error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Firstname,
    Lastname,
    Email,
    Password,
    ConfirmPassword,
    Code,
}

/// Inline messages shown next to form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub code: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.firstname.is_none()
            && self.lastname.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.confirm_password.is_none()
            && self.code.is_none()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        *self.slot_mut(field) = Some(message.into());
    }

    pub fn clear(&mut self, field: Field) {
        *self.slot_mut(field) = None;
    }

    /// Copies every error present in `other`, leaving the rest untouched
    pub fn merge(&mut self, other: FieldErrors) {
        for field in [
            Field::Firstname,
            Field::Lastname,
            Field::Email,
            Field::Password,
            Field::ConfirmPassword,
            Field::Code,
        ] {
            if let Some(message) = other.get(field) {
                self.set(field, message);
            }
        }
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Firstname => &self.firstname,
            Field::Lastname => &self.lastname,
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
            Field::Code => &self.code,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Firstname => &mut self.firstname,
            Field::Lastname => &mut self.lastname,
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::ConfirmPassword => &mut self.confirm_password,
            Field::Code => &mut self.code,
        }
    }
}
