use serde::{Deserialize, Serialize};

/// A single task in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task name
    pub name: String,

    /// Whether the task has been completed
    pub completed: bool,

    /// Free-form priority label, e.g. "low", "medium" or "high"
    pub priority: String,

    /// Deadline as entered by the user, empty when unset
    pub deadline: String,

    /// Free-text details, empty when unset
    pub details: String,
}

/// Fields supplied by a create or update request
///
/// `null` and absent keys both deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    pub name: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub details: Option<String>,
    pub completed: Option<bool>,
}

impl TaskRecord {
    /// Create a new, not yet completed task with no deadline or details
    pub fn new(name: impl Into<String>, priority: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: false,
            priority: priority.into(),
            deadline: String::new(),
            details: String::new(),
        }
    }

    /// Set the deadline (chainable)
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = deadline.into();
        self
    }

    /// Set the details (chainable)
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Build a fresh task from request fields. `completed` is always false.
    pub fn from_fields(fields: TaskFields) -> crate::Result<Self> {
        let (name, priority) = fields.required()?;
        Ok(Self {
            name,
            completed: false,
            priority,
            deadline: fields.deadline.unwrap_or_default(),
            details: fields.details.unwrap_or_default(),
        })
    }

    /// Overwrite this task with request fields.
    ///
    /// `deadline` and `details` are replaced even when absent (they become
    /// empty). `completed` is only touched when supplied. Nothing changes if
    /// a required field is missing.
    pub fn apply(&mut self, fields: TaskFields) -> crate::Result<()> {
        let (name, priority) = fields.required()?;
        self.name = name;
        self.priority = priority;
        self.deadline = fields.deadline.unwrap_or_default();
        self.details = fields.details.unwrap_or_default();
        if let Some(completed) = fields.completed {
            self.completed = completed;
        }
        Ok(())
    }
}

impl TaskFields {
    /// Create request fields carrying the two required values
    pub fn new(name: impl Into<String>, priority: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            priority: Some(priority.into()),
            ..Default::default()
        }
    }

    /// Parse a raw request body
    pub fn from_json(body: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| crate::TaskManagerError::MalformedRequestBody(e.to_string()))
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Name and priority, failing if either is absent or the name is blank
    fn required(&self) -> crate::Result<(String, String)> {
        let name = match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => return Err(crate::TaskManagerError::MissingRequiredField("name")),
        };
        let priority = self
            .priority
            .clone()
            .ok_or(crate::TaskManagerError::MissingRequiredField("priority"))?;
        Ok((name, priority))
    }
}
