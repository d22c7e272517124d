//! Navigation tab catalog and per-role tab sets.
//!
//! Tabs a role may not access are omitted from its set entirely; the UI
//! must not render them disabled.

use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A navigation tab in the app shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[serde(rename = "index")]
    Home,
    Tasks,
    Classroom,
    Chat,
    AddTask,
    AddClass,
    Settings,
}

impl Tab {
    /// Route name as used by the navigation layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Home => "index",
            Tab::Tasks => "tasks",
            Tab::Classroom => "classroom",
            Tab::Chat => "chat",
            Tab::AddTask => "add-task",
            Tab::AddClass => "add-class",
            Tab::Settings => "settings",
        }
    }

    /// Human-readable tab title.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Home => "Início",
            Tab::Tasks => "Tarefas",
            Tab::Classroom => "Aulas",
            Tab::Chat => "Chat",
            Tab::AddTask => "Nova Tarefa",
            Tab::AddClass => "Nova Aula",
            Tab::Settings => "Configurações",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tab: {0}")]
pub struct UnknownTab(pub String);

impl FromStr for Tab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(Tab::Home),
            "tasks" => Ok(Tab::Tasks),
            "classroom" => Ok(Tab::Classroom),
            "chat" => Ok(Tab::Chat),
            "add-task" => Ok(Tab::AddTask),
            "add-class" => Ok(Tab::AddClass),
            "settings" => Ok(Tab::Settings),
            other => Err(UnknownTab(other.to_string())),
        }
    }
}

/// Tabs shown before a session is initialized or while anonymous.
pub const ANONYMOUS_TABS: &[Tab] = &[Tab::Home, Tab::Tasks, Tab::Classroom, Tab::Chat];

const STUDENT_TABS: &[Tab] = &[Tab::Home, Tab::Tasks, Tab::Classroom, Tab::Chat, Tab::Settings];

const TEACHER_TABS: &[Tab] = &[
    Tab::Home,
    Tab::Tasks,
    Tab::Classroom,
    Tab::Chat,
    Tab::AddTask,
    Tab::AddClass,
];

const DIRECTOR_TABS: &[Tab] = &[
    Tab::Home,
    Tab::Tasks,
    Tab::Classroom,
    Tab::Chat,
    Tab::AddTask,
    Tab::AddClass,
    Tab::Settings,
];

/// The tab set for a role. Total over all three roles.
pub fn tabs_for(role: Role) -> &'static [Tab] {
    match role {
        Role::Student => STUDENT_TABS,
        Role::Teacher => TEACHER_TABS,
        Role::Director => DIRECTOR_TABS,
    }
}
