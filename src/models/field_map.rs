use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ticket::UserId;

pub const NOT_PROVIDED: &str = "Not Provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    EmployeeName,
    EmployeeEmail,
    EmployeePhone,
    EmployeeType,
    ManagerName,
    ManagerEmail,
    ManagerPhone,
    EmployeeId,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct QuestionFieldMap(HashMap<String, SemanticField>);

impl QuestionFieldMap {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn resolve(&self, question_id: &str) -> Option<SemanticField> {
        self.0.get(question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, SemanticField)> for QuestionFieldMap {
    fn from_iter<I: IntoIterator<Item = (String, SemanticField)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct StaffMap(HashMap<String, UserId>);

impl StaffMap {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn agent_for(&self, staff_id: &str) -> Option<UserId> {
        self.0.get(staff_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, UserId)> for StaffMap {
    fn from_iter<I: IntoIterator<Item = (String, UserId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeDetails {
    pub employee_name: Option<String>,
    pub employee_email: Option<String>,
    pub employee_phone: Option<String>,
    pub employee_type: Option<String>,
    pub manager_name: Option<String>,
    pub manager_email: Option<String>,
    pub manager_phone: Option<String>,
    pub employee_id: Option<String>,
}

impl EmployeeDetails {
    /// Blank values are ignored so they never shadow an earlier answer.
    pub fn set(&mut self, field: SemanticField, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = match field {
            SemanticField::EmployeeName => &mut self.employee_name,
            SemanticField::EmployeeEmail => &mut self.employee_email,
            SemanticField::EmployeePhone => &mut self.employee_phone,
            SemanticField::EmployeeType => &mut self.employee_type,
            SemanticField::ManagerName => &mut self.manager_name,
            SemanticField::ManagerEmail => &mut self.manager_email,
            SemanticField::ManagerPhone => &mut self.manager_phone,
            SemanticField::EmployeeId => &mut self.employee_id,
        };
        *slot = Some(value.to_string());
    }

    pub fn get(&self, field: SemanticField) -> Option<&str> {
        match field {
            SemanticField::EmployeeName => self.employee_name.as_deref(),
            SemanticField::EmployeeEmail => self.employee_email.as_deref(),
            SemanticField::EmployeePhone => self.employee_phone.as_deref(),
            SemanticField::EmployeeType => self.employee_type.as_deref(),
            SemanticField::ManagerName => self.manager_name.as_deref(),
            SemanticField::ManagerEmail => self.manager_email.as_deref(),
            SemanticField::ManagerPhone => self.manager_phone.as_deref(),
            SemanticField::EmployeeId => self.employee_id.as_deref(),
        }
    }

    pub fn display(&self, field: SemanticField) -> &str {
        self.get(field).unwrap_or(NOT_PROVIDED)
    }
}
