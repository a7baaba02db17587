use std::collections::HashMap;

use serde::Serialize;

use crate::docker::{ContainerSummary, ImageSummary, Port};

/// Placeholder for a missing image name or tag.
const NONE: &str = "none";

/// One entry of the `containers_list` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub image: String,
    pub status: String,
    pub state: String,
    pub names: Vec<String>,
    pub ports: Vec<Port>,
}

impl From<ContainerSummary> for ContainerInfo {
    fn from(value: ContainerSummary) -> Self {
        Self {
            id: value.id,
            image: value.image,
            status: value.status,
            state: value.state,
            names: value.names,
            ports: value.ports,
        }
    }
}

/// One entry of the `images_list` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInfo {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub tag: String,
    pub created: i64,
    pub size: i64,
    pub num_containers: usize,
}

impl ImageInfo {
    /// Builds the entry for `image`, looking up its container count by full image id.
    pub fn new(image: ImageSummary, counts: &HashMap<String, usize>) -> Self {
        let num_containers = counts.get(&image.id).copied().unwrap_or_default();
        let (name, tag) = name_and_tag(image.repo_tags.as_deref().unwrap_or_default());
        Self {
            id: strip_digest_algorithm(&image.id).to_owned(),
            name,
            tag,
            created: image.created,
            size: image.size,
            num_containers,
        }
    }
}

/// Counts containers per image id.
pub fn containers_per_image(containers: &[ContainerSummary]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for container in containers {
        *counts.entry(container.image_id.clone()).or_default() += 1;
    }
    counts
}

/// `sha256:abc` -> `abc`
fn strip_digest_algorithm(id: &str) -> &str {
    id.split_once(':').map_or(id, |(_, digest)| digest)
}

/// Name is the first repo tag as a whole; tag is what follows its last `:`.
///
/// A `:` that belongs to a registry port (`localhost:5000/app`) is not a tag separator.
fn name_and_tag(repo_tags: &[String]) -> (String, String) {
    let Some(first) = repo_tags.first() else {
        return (NONE.to_owned(), NONE.to_owned());
    };
    let tag = first
        .rsplit_once(':')
        .map(|(_, tag)| tag)
        .filter(|tag| !tag.is_empty() && !tag.contains('/'))
        .unwrap_or(NONE);
    (first.clone(), tag.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(id: &str, image_id: &str) -> ContainerSummary {
        ContainerSummary {
            id: id.to_owned(),
            names: vec![format!("/{id}")],
            image: "nginx:latest".to_owned(),
            image_id: image_id.to_owned(),
            state: "running".to_owned(),
            status: "Up 5 minutes".to_owned(),
            ports: vec![],
        }
    }

    fn image(id: &str, repo_tags: Option<&[&str]>) -> ImageSummary {
        ImageSummary {
            id: id.to_owned(),
            repo_tags: repo_tags.map(|tags| tags.iter().map(|t| (*t).to_owned()).collect()),
            created: 1_700_000_000,
            size: 4096,
        }
    }

    #[test]
    fn test_container_info_shape() {
        let mut summary = container("abc", "sha256:1");
        summary.ports = vec![Port {
            ip: None,
            private_port: 80,
            public_port: None,
            kind: "tcp".to_owned(),
        }];
        let value = serde_json::to_value(ContainerInfo::from(summary)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ID": "abc",
                "Image": "nginx:latest",
                "Status": "Up 5 minutes",
                "State": "running",
                "Names": ["/abc"],
                "Ports": [{"PrivatePort": 80, "Type": "tcp"}],
            })
        );
    }

    #[test]
    fn test_image_info_shape() {
        let counts = containers_per_image(&[
            container("a", "sha256:1"),
            container("b", "sha256:1"),
            container("c", "sha256:2"),
        ]);
        let info = ImageInfo::new(image("sha256:1", Some(&["nginx:1.27", "nginx:latest"])), &counts);
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            serde_json::json!({
                "ID": "1",
                "Name": "nginx:1.27",
                "Tag": "1.27",
                "Created": 1_700_000_000,
                "Size": 4096,
                "NumContainers": 2,
            })
        );
    }

    #[test]
    fn test_dangling_image_without_containers() {
        let info = ImageInfo::new(image("sha256:3", None), &HashMap::new());
        assert_eq!(info.name, "none");
        assert_eq!(info.tag, "none");
        assert_eq!(info.num_containers, 0);
    }

    #[test]
    fn test_name_and_tag() {
        let tags = |raw: &[&str]| raw.iter().map(|t| (*t).to_owned()).collect::<Vec<_>>();
        assert_eq!(
            name_and_tag(&tags(&["redis:7"])),
            ("redis:7".to_owned(), "7".to_owned())
        );
        assert_eq!(
            name_and_tag(&tags(&["localhost:5000/app"])),
            ("localhost:5000/app".to_owned(), "none".to_owned())
        );
        assert_eq!(
            name_and_tag(&tags(&["localhost:5000/app:v2"])),
            ("localhost:5000/app:v2".to_owned(), "v2".to_owned())
        );
        assert_eq!(name_and_tag(&[]), ("none".to_owned(), "none".to_owned()));
    }

    #[test]
    fn test_strip_digest_algorithm() {
        assert_eq!(strip_digest_algorithm("sha256:abc"), "abc");
        assert_eq!(strip_digest_algorithm("abc"), "abc");
    }
}
