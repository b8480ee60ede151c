use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Teachers: the subject/class pairs they teach.
    #[serde(default)]
    pub teaching: Vec<TeachingAssignment>,
    /// Students: the class they are enrolled in.
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingAssignment {
    pub subject: String,
    #[serde(rename = "class")]
    pub class_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Admin,
    #[serde(alias = "superadmin", alias = "super-admin")]
    SuperAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    TakeTests,
    AuthorTests,
    ManageQuestionBank,
    ApproveTests,
    ScheduleTests,
    CorrectScores,
    ManageUsers,
    DeleteTests,
    ManageAdmins,
}

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Student => &[TakeTests],
            Role::Teacher => &[AuthorTests, ManageQuestionBank],
            Role::Admin => &[
                AuthorTests,
                ManageQuestionBank,
                ApproveTests,
                ScheduleTests,
                CorrectScores,
                ManageUsers,
                DeleteTests,
            ],
            Role::SuperAdmin => &[
                AuthorTests,
                ManageQuestionBank,
                ApproveTests,
                ScheduleTests,
                CorrectScores,
                ManageUsers,
                DeleteTests,
                ManageAdmins,
            ],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_sets() {
        assert!(Role::Student.can(Capability::TakeTests));
        assert!(!Role::Student.can(Capability::AuthorTests));
        assert!(Role::Teacher.can(Capability::ManageQuestionBank));
        assert!(!Role::Teacher.can(Capability::ScheduleTests));
        assert!(Role::Admin.can(Capability::ScheduleTests));
        assert!(!Role::Admin.can(Capability::ManageAdmins));
        assert!(Role::SuperAdmin.can(Capability::ManageAdmins));
        assert!(!Role::SuperAdmin.can(Capability::TakeTests));
    }

    #[test]
    fn role_wire_names() {
        let role: Role = serde_json::from_str("\"super_admin\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
        let role: Role = serde_json::from_str("\"superadmin\"").unwrap();
        assert_eq!(role, Role::SuperAdmin);
        assert!(serde_json::from_str::<Role>("\"janitor\"").is_err());
    }
}
