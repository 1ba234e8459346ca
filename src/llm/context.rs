//! Versioned prompt templates and prompt rendering
//!
//! A prompt is a pure function of its [`PromptContext`]. Templates are
//! `'static` values looked up by version string; changing the wording of a
//! template means adding a new version, never editing an old one.

use crate::core::error::ConfigError;
use crate::core::types::{EntitySet, Query};

/// Template version used when configuration does not pin one
pub const CURRENT_TEMPLATE_VERSION: &str = "v2";

/// Input → expected commands pair shown to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedExample {
    pub input: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    pub version: &'static str,
    pub instructions: &'static str,
    pub examples: &'static [WorkedExample],
}

static TEMPLATE_V1: PromptTemplate = PromptTemplate {
    version: "v1",
    instructions: "Translate the instruction into robo CLI commands.\n\
Use only the robo, ros2, gz or webots commands.\n\
Output one command per line and nothing else.",
    examples: &[
        WorkedExample {
            input: "start gazebo",
            commands: &["robo sim launch gazebo"],
        },
        WorkedExample {
            input: "show the laser scan",
            commands: &["robo echo /scan"],
        },
    ],
};

static TEMPLATE_V2: PromptTemplate = PromptTemplate {
    version: "v2",
    instructions: "You translate natural language robotics instructions into commands for the robo CLI.\n\
Rules:\n\
- Use only these namespaces: robo sim, robo pub, robo echo, robo param, robo node, robo gen, robo nav, ros2, gz, webots.\n\
- Output one command per line, in execution order, with no commentary or formatting.\n\
- Reuse the topics, coordinates, parameters and robot models listed under ENTITIES.\n\
- Never emit shell pipelines, redirections, sudo, or file deletion.",
    examples: &[
        WorkedExample {
            input: "launch gazebo with turtlebot3 burger",
            commands: &["robo sim launch gazebo --robot turtlebot3_burger"],
        },
        WorkedExample {
            input: "move the robot forward at 0.5 m/s",
            commands: &[
                "robo pub /cmd_vel --message-type geometry_msgs/msg/Twist --data '{linear: {x: 0.5}}'",
            ],
        },
        WorkedExample {
            input: "navigate to 2, 3",
            commands: &["robo nav goal --x 2 --y 3"],
        },
        WorkedExample {
            input: "generate a talker node then launch webots",
            commands: &["robo gen node talker", "robo sim launch webots"],
        },
        WorkedExample {
            input: "show 5 messages from /odom",
            commands: &["robo echo /odom --count 5"],
        },
    ],
};

static TEMPLATES: [&PromptTemplate; 2] = [&TEMPLATE_V1, &TEMPLATE_V2];

/// Look up a template by version string
pub fn template(version: &str) -> Result<&'static PromptTemplate, ConfigError> {
    TEMPLATES
        .iter()
        .copied()
        .find(|t| t.version == version)
        .ok_or_else(|| ConfigError::UnknownTemplate(version.to_string()))
}

/// All known template versions, oldest first
pub fn template_versions() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|t| t.version)
}

/// Everything a prompt is rendered from
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub template: &'static PromptTemplate,
    /// EntitySet as compact key-sorted JSON
    pub entities_json: String,
    pub query: String,
}

impl PromptContext {
    pub fn new(template: &'static PromptTemplate, entities: &EntitySet, query: &Query) -> Self {
        Self {
            template,
            entities_json: entities.to_json(),
            query: query.normalized().to_string(),
        }
    }

    pub fn template_version(&self) -> &'static str {
        self.template.version
    }

    pub fn examples(&self) -> &'static [WorkedExample] {
        self.template.examples
    }

    /// Render the prompt text
    pub fn render(&self) -> String {
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(self.template.instructions);
        prompt.push_str("\n\nEXAMPLES:\n");
        for example in self.template.examples {
            prompt.push_str("Input: ");
            prompt.push_str(example.input);
            prompt.push('\n');
            for command in example.commands {
                prompt.push_str(command);
                prompt.push('\n');
            }
            prompt.push('\n');
        }
        prompt.push_str("ENTITIES: ");
        prompt.push_str(&self.entities_json);
        prompt.push_str("\n\nINSTRUCTION: ");
        prompt.push_str(&self.query);
        prompt.push_str("\nCOMMANDS:\n");
        prompt
    }
}

/// Build the prompt for a query in one step
pub fn build_prompt(
    template: &'static PromptTemplate,
    entities: &EntitySet,
    query: &Query,
) -> String {
    PromptContext::new(template, entities, query).render()
}
