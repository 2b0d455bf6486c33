use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::error::{MastError, Result};
use crate::record::Subject;

/// One registered student and the tests they signed up for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub school_id: u32,
    pub student_id: u32,
    pub name: String,
    pub test_1: Option<Subject>,
    #[serde(default)]
    pub test_2: Option<Subject>,
}

impl RegistrationRecord {
    pub fn assigned_tests(&self) -> impl Iterator<Item = Subject> + '_ {
        self.test_1.into_iter().chain(self.test_2)
    }
}

/// Registered students indexed by (school, student).
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<RegistrationRecord>,
    index: HashMap<(u32, u32), usize>,
}

impl Roster {
    /// Later entries for the same (school, student) do not replace earlier ones.
    pub fn new(students: Vec<RegistrationRecord>) -> Self {
        let mut index = HashMap::new();
        for (i, student) in students.iter().enumerate() {
            index
                .entry((student.school_id, student.student_id))
                .or_insert(i);
        }
        Self { students, index }
    }

    pub fn find(&self, school_id: u32, student_id: u32) -> Option<&RegistrationRecord> {
        self.index
            .get(&(school_id, student_id))
            .map(|i| &self.students[*i])
    }

    pub fn contains(&self, school_id: u32, student_id: u32) -> bool {
        self.index.contains_key(&(school_id, student_id))
    }

    pub fn name(&self, school_id: u32, student_id: u32) -> Option<&str> {
        self.find(school_id, student_id).map(|s| s.name.as_str())
    }

    pub fn students(&self) -> &[RegistrationRecord] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: u32,
    pub name: String,
}

/// School names by ID, for rankings.
#[derive(Debug, Clone, Default)]
pub struct SchoolDirectory {
    names: HashMap<u32, String>,
}

impl SchoolDirectory {
    pub fn new(schools: Vec<School>) -> Self {
        Self {
            names: schools.into_iter().map(|s| (s.id, s.name)).collect(),
        }
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| MastError::fatal_load(path, e.to_string()))?;
    serde_json::from_reader(file).map_err(|e| MastError::fatal_load(path, e.to_string()))
}

/// Load the registration roster (JSON array of students).
pub fn load_roster(path: &Path) -> Result<Roster> {
    let students: Vec<RegistrationRecord> = read_json(path)?;
    tracing::debug!(path = %path.display(), students = students.len(), "loaded roster");
    Ok(Roster::new(students))
}

/// Load the school directory (JSON array of `{id, name}`).
pub fn load_schools(path: &Path) -> Result<SchoolDirectory> {
    let schools: Vec<School> = read_json(path)?;
    tracing::debug!(path = %path.display(), schools = schools.len(), "loaded schools");
    Ok(SchoolDirectory::new(schools))
}
