//! Generates an Apache vhost file for a host.
//!
//! The rendered shape depends on the `host.schema` fact: plain HTTP hosts
//! get a single `*:80` (or `*:<host.port>`) vhost, HTTPS hosts get a
//! redirecting `*:80` vhost plus a full `*:443` vhost inside an
//! `<IfModule mod_ssl.c>` guard.

use std::path::{Path, PathBuf};

use super::{Task, TaskError, write_artifact};
use crate::config::ConfigRead;

/// Renders an Apache vhost to `<etc.apache.vhost_location>/<host.name>.conf`.
pub struct Vhost;

/// A line of output or a nested block rendered one tab deeper.
enum Node {
  Line(String),
  Block(Vec<Node>),
}

impl Node {
  fn line(text: impl Into<String>) -> Node {
    Node::Line(text.into())
  }

  fn blank() -> Node {
    Node::Line(String::new())
  }
}

impl Task for Vhost {
  fn identifier(&self) -> &'static str {
    "generate:vhost"
  }

  fn run(&self, config: &dyn ConfigRead) -> Result<PathBuf, TaskError> {
    let mut schema = config.fact_or("host.schema", "http");

    let port = if config.has_fact("host.port") {
      // An explicit port forces plain HTTP.
      schema = "http".to_string();
      config.fact("host.port")?
    } else {
      "80".to_string()
    };

    let nodes = if schema == "https" {
      self.https_vhost(config)?
    } else {
      vec![
        Node::line(format!("<VirtualHost *:{port}>")),
        Node::Block(self.common_sections(config, false)?),
        Node::line("</VirtualHost>"),
      ]
    };

    let mut content = String::new();
    render(&nodes, "", &mut content);

    let dir = config.fact_or("etc.apache.vhost_location", "/etc/apache/sites-available");
    let path = Path::new(&dir).join(format!("{}.conf", config.fact("host.name")?));

    write_artifact(&path, &content)?;
    Ok(path)
  }
}

impl Vhost {
  /// Redirecting `*:80` vhost plus the real `*:443` vhost.
  fn https_vhost(&self, config: &dyn ConfigRead) -> Result<Vec<Node>, TaskError> {
    let mut redirect = server_name(config)?;
    redirect.push(Node::line("RewriteEngine On"));
    redirect.push(Node::line("RewriteRule ^(.*)$ https://%{HTTP_HOST}$1 [R=301,L]"));

    let https = vec![
      Node::line("<VirtualHost *:443>"),
      Node::Block(self.common_sections(config, true)?),
      Node::line("</VirtualHost>"),
    ];

    Ok(vec![
      Node::line("<VirtualHost *:80>"),
      Node::Block(redirect),
      Node::line("</VirtualHost>"),
      Node::blank(),
      Node::line("<IfModule mod_ssl.c>"),
      Node::Block(https),
      Node::line("</IfModule>"),
    ])
  }

  /// The shared inner sections, in rendering order. SSL settings only
  /// appear in the `*:443` vhost.
  fn common_sections(&self, config: &dyn ConfigRead, ssl: bool) -> Result<Vec<Node>, TaskError> {
    let mut nodes = server_name(config)?;
    nodes.extend(apache_config(config)?);
    nodes.extend(cache_settings(config));
    nodes.extend(env_vars(config)?);
    if ssl {
      nodes.extend(ssl_config(config)?);
    }
    nodes.extend(keep_alive(config));
    nodes.extend(directory(config)?);

    Ok(nodes)
  }
}

fn server_name(config: &dyn ConfigRead) -> Result<Vec<Node>, TaskError> {
  let mut nodes = vec![Node::line(format!("ServerName {}", config.fact("host.name")?))];

  if config.has_fact("host.alias") {
    for alias in config.fact("host.alias")?.split(';') {
      nodes.push(Node::line(format!("ServerAlias {alias}")));
    }
  }

  nodes.push(Node::blank());
  Ok(nodes)
}

fn apache_config(config: &dyn ConfigRead) -> Result<Vec<Node>, TaskError> {
  Ok(vec![
    Node::line("ServerAdmin webmaster@localhost"),
    Node::line(format!(
      "DocumentRoot /var/www/{}/current/{}",
      config.fact("host.name")?,
      config.fact_or("etc.apache.document_root", "web")
    )),
    Node::blank(),
    Node::line("ErrorLog ${APACHE_LOG_DIR}/error.log"),
    Node::line("CustomLog ${APACHE_LOG_DIR}/access.log combined"),
    Node::blank(),
  ])
}

fn cache_settings(config: &dyn ConfigRead) -> Vec<Node> {
  let cache_control = config.fact_or("host.cache-control", "");
  if cache_control.is_empty() {
    return Vec::new();
  }

  vec![
    Node::line(format!("Header set Cache-Control \"max-age={cache_control}, public\"")),
    Node::blank(),
  ]
}

fn env_vars(config: &dyn ConfigRead) -> Result<Vec<Node>, TaskError> {
  let mut nodes = Vec::new();

  for key in config.environment_variable_keys() {
    let value = config.environment_variable(&key)?;
    nodes.push(Node::line(format!("SetEnv {key} \"{value}\"")));
  }

  nodes.push(Node::blank());
  Ok(nodes)
}

fn ssl_config(config: &dyn ConfigRead) -> Result<Vec<Node>, TaskError> {
  let base_path = config.fact("cert.base_path")?;
  let domain = if config.has_fact("cert.host_name") {
    config.fact("cert.host_name")?
  } else {
    config.fact("host.name")?
  };

  let options_dir = Path::new(&base_path)
    .parent()
    .map(|p| p.display().to_string())
    .unwrap_or_default();

  Ok(vec![
    Node::line(format!("Include {options_dir}/options-ssl-apache.conf")),
    Node::line(format!(
      "SSLCertificateFile {base_path}/{domain}/{}",
      config.fact_or("cert.cert_name", "cert.pem")
    )),
    Node::line(format!(
      "SSLCertificateKeyFile {base_path}/{domain}/{}",
      config.fact_or("cert.privkey_name", "privkey.pem")
    )),
    Node::line(format!(
      "SSLCertificateChainFile {base_path}/{domain}/{}",
      config.fact_or("cert.chain_name", "chain.pem")
    )),
    Node::blank(),
  ])
}

fn keep_alive(config: &dyn ConfigRead) -> Vec<Node> {
  if config.fact_or("host.keep-alive", "no") != "yes" {
    return Vec::new();
  }

  vec![
    Node::line("KeepAlive On"),
    Node::line(format!(
      "MaxKeepAliveRequests {}",
      config.fact_or("host.keep-alive-max-requests", "100")
    )),
    Node::line(format!(
      "KeepAliveTimeout {}",
      config.fact_or("host.keep-alive-timeout", "100")
    )),
    Node::blank(),
  ]
}

fn directory(config: &dyn ConfigRead) -> Result<Vec<Node>, TaskError> {
  let indexed = config.fact_or("host.indexed", "no") == "yes";
  let htaccess = config.fact_or("host.htaccess", "yes") == "yes";

  let options = if indexed {
    "Options Indexes FollowSymLinks"
  } else {
    "Options FollowSymLinks"
  };
  let allow_override = if htaccess { "AllowOverride All" } else { "AllowOverride None" };

  Ok(vec![
    Node::line(format!(
      "<Directory /var/www/{}/current/{}>",
      config.fact("host.name")?,
      config.fact_or("etc.apache.document_root", "web")
    )),
    Node::Block(vec![
      Node::line(options),
      Node::line(allow_override),
      Node::line("Require all granted"),
      Node::line("Allow from all"),
    ]),
    Node::line("</Directory>"),
  ])
}

/// Render nodes, nesting blocks one tab deeper. Blank lines carry no indent.
fn render(nodes: &[Node], indent: &str, out: &mut String) {
  for node in nodes {
    match node {
      Node::Line(text) if text.is_empty() => out.push('\n'),
      Node::Line(text) => {
        out.push_str(indent);
        out.push_str(text);
        out.push('\n');
      }
      Node::Block(children) => render(children, &format!("{indent}\t"), out),
    }
  }
}
