//! Docker Compose configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Docker Compose file configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Compose file version
    #[serde(default)]
    pub version: Option<String>,
    /// Project name
    #[serde(default)]
    pub name: Option<String>,
    /// Services
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Image name
    pub image: Option<String>,
    /// Build configuration
    pub build: Option<BuildConfig>,
    /// Dockerfile name (version 1 files)
    pub dockerfile: Option<String>,
    /// Command to run
    pub command: Option<CommandConfig>,
    /// Entrypoint
    pub entrypoint: Option<CommandConfig>,
    /// Container name
    pub container_name: Option<String>,
    /// Environment variables
    pub environment: Option<EnvironmentConfig>,
    /// Environment file
    pub env_file: Option<StringOrList>,
    /// Labels
    pub labels: Option<LabelsConfig>,
    /// Port mappings
    pub ports: Vec<PortConfig>,
    /// Volume mounts
    pub volumes: Vec<VolumeMount>,
    /// Containers or services to share volumes with
    pub volumes_from: Vec<String>,
    /// Links to other services
    pub links: Vec<String>,
    /// Links to containers outside the project
    pub external_links: Vec<String>,
    /// Working directory
    pub working_dir: Option<String>,
    /// User
    pub user: Option<ScalarValue>,
    /// TTY
    pub tty: bool,
    /// Stdin open
    pub stdin_open: bool,
    /// Privileged mode
    pub privileged: bool,
    /// Read only root filesystem
    pub read_only: bool,
    /// Memory limit
    pub mem_limit: Option<ByteSize>,
    /// Memory plus swap limit
    pub memswap_limit: Option<ByteSize>,
    /// CFS quota in microseconds per 100ms period
    pub cpu_quota: Option<i64>,
    /// Relative CPU weight
    pub cpu_shares: Option<i64>,
    /// CPUs to pin to
    pub cpuset: Option<String>,
    /// Capabilities to add
    pub cap_add: Vec<String>,
    /// Capabilities to drop
    pub cap_drop: Vec<String>,
    /// Parent cgroup
    pub cgroup_parent: Option<String>,
    /// Devices
    pub devices: Vec<String>,
    /// DNS servers
    pub dns: Option<StringOrList>,
    /// DNS search domains
    pub dns_search: Option<StringOrList>,
    /// Domain name
    pub domainname: Option<String>,
    /// Hostname
    pub hostname: Option<String>,
    /// Log driver (version 1 files)
    pub log_driver: Option<String>,
    /// Log driver options (version 1 files)
    pub log_opt: BTreeMap<String, ScalarValue>,
    /// MAC address
    pub mac_address: Option<String>,
    /// Network mode (version 1 files)
    pub net: Option<String>,
    /// Network mode
    pub network_mode: Option<String>,
    /// PID mode
    pub pid: Option<String>,
    /// UTS mode
    pub uts: Option<String>,
    /// IPC mode
    pub ipc: Option<String>,
    /// Restart policy
    pub restart: Option<String>,
    /// Security options
    pub security_opt: Vec<String>,
    /// Volume driver
    pub volume_driver: Option<String>,
    /// Extra hosts
    pub extra_hosts: Option<ExtraHostsConfig>,
    /// Ulimits
    pub ulimits: BTreeMap<String, UlimitConfig>,
}

impl ServiceConfig {
    /// Build context path, if the service declares a non-empty one
    pub fn build_context(&self) -> Option<&str> {
        let context = match self.build.as_ref()? {
            BuildConfig::Simple(path) => path.as_str(),
            BuildConfig::Full(full) => full.context.as_deref()?,
        };
        if context.is_empty() {
            None
        } else {
            Some(context)
        }
    }

    /// Port mappings in short syntax
    pub fn port_specs(&self) -> Vec<String> {
        self.ports.iter().map(PortConfig::spec).collect()
    }

    /// Volume mounts in short syntax
    pub fn volume_specs(&self) -> Vec<String> {
        self.volumes.iter().map(VolumeMount::spec).collect()
    }

    /// User as declared, rendered as a string
    pub fn user(&self) -> Option<String> {
        self.user.as_ref().map(ScalarValue::to_string)
    }

    /// Numeric user id, if the user is numeric
    pub fn numeric_user(&self) -> Option<i64> {
        self.user()?.parse().ok()
    }

    /// Link declarations split into (service, alias)
    pub fn link_aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().filter_map(|link| link.split_once(':'))
    }
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildConfig {
    /// Simple context path
    Simple(String),
    /// Full build configuration
    Full(BuildConfigFull),
}

/// Full build configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfigFull {
    /// Build context
    pub context: Option<String>,
    /// Dockerfile path
    pub dockerfile: Option<String>,
    /// Build arguments
    #[serde(default)]
    pub args: Option<BTreeMap<String, ScalarValue>>,
}

/// Command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandConfig {
    /// Shell command string
    Shell(String),
    /// Exec form array
    Exec(Vec<String>),
}

impl CommandConfig {
    /// Command as a list of words. Shell strings are split like a shell would.
    pub fn words(&self) -> Vec<String> {
        match self {
            CommandConfig::Shell(s) => split_words(s),
            CommandConfig::Exec(arr) => arr.clone(),
        }
    }
}

/// Split a command line on whitespace, honoring single and double quotes
/// and backslash escapes.
pub fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '\'') | (None, '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// A YAML scalar that compose accepts in string positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => write!(f, "{}", x),
            ScalarValue::String(s) => write!(f, "{}", s),
        }
    }
}

/// Environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentConfig {
    /// Array of KEY=value strings
    Array(Vec<String>),
    /// Map of key to value
    Map(BTreeMap<String, Option<ScalarValue>>),
}

impl EnvironmentConfig {
    /// Environment as KEY=value declarations
    pub fn declarations(&self) -> Vec<String> {
        match self {
            EnvironmentConfig::Array(arr) => arr.clone(),
            EnvironmentConfig::Map(map) => map
                .iter()
                .map(|(key, value)| match value {
                    Some(v) => format!("{}={}", key, v),
                    None => key.clone(),
                })
                .collect(),
        }
    }
}

/// A single string or a list of strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    /// Single value
    Single(String),
    /// Multiple values
    List(Vec<String>),
}

impl StringOrList {
    /// Values as a list
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StringOrList::Single(s) => vec![s.clone()],
            StringOrList::List(list) => list.clone(),
        }
    }

    /// Whether no values are present
    pub fn is_empty(&self) -> bool {
        match self {
            StringOrList::Single(s) => s.is_empty(),
            StringOrList::List(list) => list.is_empty(),
        }
    }
}

/// Labels configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelsConfig {
    /// Array of "key=value" strings
    Array(Vec<String>),
    /// Map of key to value
    Map(BTreeMap<String, Option<ScalarValue>>),
}

impl LabelsConfig {
    /// Whether no labels are present
    pub fn is_empty(&self) -> bool {
        match self {
            LabelsConfig::Array(arr) => arr.is_empty(),
            LabelsConfig::Map(map) => map.is_empty(),
        }
    }
}

/// Extra hosts configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraHostsConfig {
    /// Array of "host:ip" strings
    Array(Vec<String>),
    /// Map of host to ip
    Map(BTreeMap<String, String>),
}

impl ExtraHostsConfig {
    /// Whether no hosts are present
    pub fn is_empty(&self) -> bool {
        match self {
            ExtraHostsConfig::Array(arr) => arr.is_empty(),
            ExtraHostsConfig::Map(map) => map.is_empty(),
        }
    }
}

/// Port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortConfig {
    /// Bare container port: 8080
    Number(u32),
    /// Short syntax: "8080:80"
    Short(String),
    /// Long syntax
    Long(PortConfigLong),
}

impl PortConfig {
    /// Port in short syntax, `[[IP:]HOST:]CONTAINER[/PROTOCOL]`
    pub fn spec(&self) -> String {
        match self {
            PortConfig::Number(port) => port.to_string(),
            PortConfig::Short(s) => s.clone(),
            PortConfig::Long(long) => {
                let mut spec = long.target.to_string();
                if let Some(published) = &long.published {
                    spec = format!("{}:{}", published, spec);
                    if let Some(ip) = &long.host_ip {
                        spec = format!("{}:{}", ip, spec);
                    }
                }
                if let Some(protocol) = &long.protocol {
                    spec = format!("{}/{}", spec, protocol);
                }
                spec
            }
        }
    }
}

/// Long port configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortConfigLong {
    /// Target port in container
    pub target: u16,
    /// Published port on host
    pub published: Option<ScalarValue>,
    /// Host IP to bind to
    pub host_ip: Option<String>,
    /// Protocol (tcp/udp)
    pub protocol: Option<String>,
}

/// Volume mount configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeMount {
    /// Short syntax: "host:container:mode"
    Short(String),
    /// Long syntax
    Long(VolumeMountLong),
}

impl VolumeMount {
    /// Mount in short syntax, `[SOURCE:]TARGET[:MODE]`
    pub fn spec(&self) -> String {
        match self {
            VolumeMount::Short(s) => s.clone(),
            VolumeMount::Long(long) => {
                let mut spec = match &long.source {
                    Some(source) if !source.is_empty() => format!("{}:{}", source, long.target),
                    _ => long.target.clone(),
                };
                if long.read_only == Some(true) {
                    if long.source.is_none() {
                        spec = format!(":{}", spec);
                    }
                    spec.push_str(":ro");
                }
                spec
            }
        }
    }
}

/// Long volume mount configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VolumeMountLong {
    /// Mount type (volume, bind, tmpfs)
    #[serde(rename = "type")]
    pub mount_type: Option<String>,
    /// Source path or volume name
    pub source: Option<String>,
    /// Target path in container
    pub target: String,
    /// Read only
    pub read_only: Option<bool>,
}

/// Memory size, either a byte count or a string with a b/k/m/g suffix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ByteSize {
    /// Plain byte count
    Bytes(i64),
    /// Byte count with unit suffix
    Text(String),
}

impl ByteSize {
    /// Size in bytes, or `None` if the value cannot be read
    pub fn bytes(&self) -> Option<i64> {
        match self {
            ByteSize::Bytes(n) => Some(*n),
            ByteSize::Text(s) => parse_byte_size(s),
        }
    }
}

fn parse_byte_size(s: &str) -> Option<i64> {
    let s = s.trim().to_lowercase();
    let s = s.strip_suffix('b').filter(|rest| !rest.is_empty()).unwrap_or(&s);
    let (digits, multiplier) = match s.chars().last()? {
        'k' => (&s[..s.len() - 1], 1024),
        'm' => (&s[..s.len() - 1], 1024 * 1024),
        'g' => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1),
    };
    digits.trim().parse::<i64>().ok()?.checked_mul(multiplier)
}

/// Ulimit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UlimitConfig {
    /// Single value (same for soft and hard)
    Single(i64),
    /// Separate soft and hard limits
    SoftHard { soft: i64, hard: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("python app.py --port 80"), vec!["python", "app.py", "--port", "80"]);
        assert_eq!(split_words("sh -c 'echo hello world'"), vec!["sh", "-c", "echo hello world"]);
        assert_eq!(split_words(r#"echo "a \"b\"" c\ d"#), vec!["echo", "a \"b\"", "c d"]);
        assert_eq!(split_words("  "), Vec::<String>::new());
        assert_eq!(split_words("run ''"), vec!["run", ""]);
    }

    #[test]
    fn test_byte_size() {
        assert_eq!(ByteSize::Bytes(1000).bytes(), Some(1000));
        assert_eq!(ByteSize::Text("512m".into()).bytes(), Some(512 * 1024 * 1024));
        assert_eq!(ByteSize::Text("1g".into()).bytes(), Some(1024 * 1024 * 1024));
        assert_eq!(ByteSize::Text("64kb".into()).bytes(), Some(64 * 1024));
        assert_eq!(ByteSize::Text("100b".into()).bytes(), Some(100));
        assert_eq!(ByteSize::Text("lots".into()).bytes(), None);
        assert_eq!(ByteSize::Text("99999999999g".into()).bytes(), None);
    }

    #[test]
    fn test_port_spec_from_long_syntax() {
        let port = PortConfig::Long(PortConfigLong {
            target: 80,
            published: Some(ScalarValue::Int(8080)),
            host_ip: Some("127.0.0.1".into()),
            protocol: Some("udp".into()),
        });
        assert_eq!(port.spec(), "127.0.0.1:8080:80/udp");
        assert_eq!(PortConfig::Number(3000).spec(), "3000");
    }

    #[test]
    fn test_volume_spec_from_long_syntax() {
        let volume = VolumeMount::Long(VolumeMountLong {
            mount_type: Some("bind".into()),
            source: Some("./data".into()),
            target: "/data".into(),
            read_only: Some(true),
        });
        assert_eq!(volume.spec(), "./data:/data:ro");
    }

    #[test]
    fn test_environment_declarations() {
        let mut map = BTreeMap::new();
        map.insert("PORT".to_string(), Some(ScalarValue::Int(80)));
        map.insert("DEBUG".to_string(), None);
        let env = EnvironmentConfig::Map(map);
        assert_eq!(env.declarations(), vec!["DEBUG", "PORT=80"]);
    }

    #[test]
    fn test_numeric_user() {
        let mut service = ServiceConfig {
            user: Some(ScalarValue::Int(1001)),
            ..Default::default()
        };
        assert_eq!(service.numeric_user(), Some(1001));

        service.user = Some(ScalarValue::String("www-data".into()));
        assert_eq!(service.numeric_user(), None);
        assert_eq!(service.user().as_deref(), Some("www-data"));
    }

    #[test]
    fn test_build_context() {
        let service = ServiceConfig {
            build: Some(BuildConfig::Full(BuildConfigFull {
                context: Some("./api".into()),
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(service.build_context(), Some("./api"));

        let empty = ServiceConfig {
            build: Some(BuildConfig::Simple(String::new())),
            ..Default::default()
        };
        assert_eq!(empty.build_context(), None);
    }
}
