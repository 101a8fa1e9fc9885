use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{opt_status, Status};
use crate::normalize::{opt_text, parse_float, trimmed};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    pub salary: f64,
    /// `YYYY-MM-DD`
    pub hire_date: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    #[serde(default, deserialize_with = "opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub position: Option<String>,
    pub salary: Option<Value>,
    #[serde(default, deserialize_with = "opt_text")]
    pub hire_date: Option<String>,
    #[serde(default, deserialize_with = "opt_status")]
    pub status: Option<Status>,
}

impl Employee {
    pub fn create(id: String, input: EmployeeInput, now: DateTime<Utc>) -> Self {
        let hire_date = input
            .hire_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string());

        Self {
            id,
            name: trimmed(input.name),
            email: trimmed(input.email),
            phone: trimmed(input.phone),
            department: trimmed(input.department),
            position: trimmed(input.position),
            salary: input.salary.as_ref().and_then(parse_float).unwrap_or(0.0),
            hire_date,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: None,
        }
    }

    pub fn apply(&mut self, input: &EmployeeInput, now: DateTime<Utc>) {
        let fields = [
            (&input.name, &mut self.name),
            (&input.email, &mut self.email),
            (&input.phone, &mut self.phone),
            (&input.department, &mut self.department),
            (&input.position, &mut self.position),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }

        if let Some(salary) = input.salary.as_ref().and_then(parse_float) {
            self.salary = salary;
        }
        if let Some(hire_date) = input.hire_date.as_deref().map(str::trim) {
            if !hire_date.is_empty() {
                self.hire_date = hire_date.to_string();
            }
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn input(body: Value) -> EmployeeInput {
        serde_json::from_value(body).expect("valid employee body")
    }

    #[test]
    fn test_create_defaults_hire_date_to_today() {
        let now = Utc.with_ymd_and_hms(2026, 4, 2, 9, 30, 0).unwrap();
        let employee = Employee::create(
            "e1".into(),
            input(json!({ "name": "Lin", "department": "Sales", "salary": "abc" })),
            now,
        );

        assert_eq!(employee.hire_date, "2026-04-02");
        assert_eq!(employee.salary, 0.0);
        assert_eq!(employee.phone, "");
        assert_eq!(employee.status, Status::Active);
    }

    #[test]
    fn test_apply_partial() {
        let now = Utc::now();
        let mut employee = Employee::create(
            "e1".into(),
            input(json!({
                "name": "Lin",
                "email": "lin@example.com",
                "department": "Sales",
                "position": "Lead",
                "salary": 4200,
                "hireDate": "2025-01-15"
            })),
            now,
        );

        employee.apply(&input(json!({ "position": " Manager ", "salary": "5100.5" })), now);

        assert_eq!(employee.position, "Manager");
        assert_eq!(employee.salary, 5100.5);
        assert_eq!(employee.department, "Sales");
        assert_eq!(employee.hire_date, "2025-01-15");
        assert_eq!(employee.updated_at, Some(now));
    }
}
