//! Pinned component definitions: where each archive comes from, where it
//! goes and how to tell it is already installed.
use crate::config::Config;
use crate::resources::artifact::ArtifactSpec;
use crate::resources::hook::{PostInstallHook, shell_quote};
use crate::resources::probe::{Probe, VersionProbe};

fn lossy(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Go toolchain, published as `GOROOT`.
#[must_use]
pub fn go(config: &Config) -> ArtifactSpec {
    let destination = config.goroot();
    ArtifactSpec {
        name: "go".to_string(),
        source: "https://storage.googleapis.com/golang/go1.5.1.linux-amd64.tar.gz".to_string(),
        name_hint: "go.tar.gz".to_string(),
        root_dir: "go".to_string(),
        probe: Probe::Version(
            VersionProbe::exact(
                destination.join("bin/go"),
                &["version"],
                "go version go1.5.1 linux/amd64",
            )
            .with_env("GOROOT", lossy(&destination)),
        ),
        destination,
        hook: None,
    }
}

/// fish shell, built from source into the home prefix and made the login
/// shell.
#[must_use]
pub fn fish(config: &Config) -> ArtifactSpec {
    let fish_bin = config.bin_dir.join("fish");
    ArtifactSpec {
        name: "fish".to_string(),
        source: "http://fishshell.com/files/2.2.0/fish-2.2.0.tar.gz".to_string(),
        name_hint: "fish.tar.gz".to_string(),
        root_dir: "fish-2.2.0".to_string(),
        destination: config.dist("fish"),
        probe: Probe::Version(VersionProbe::exact(
            &fish_bin,
            &["--version"],
            "fish, version 2.2.0",
        )),
        hook: Some(PostInstallHook::new([
            format!("./configure --prefix={}", shell_quote(&lossy(&config.home))),
            "make".to_string(),
            "make install".to_string(),
            format!(
                "sudo chsh -s {} {}",
                shell_quote(&lossy(&fish_bin)),
                shell_quote(&config.user)
            ),
        ])),
    }
}

/// Google App Engine SDK for Go.
#[must_use]
pub fn appengine(config: &Config) -> ArtifactSpec {
    let destination = config.dist("go_appengine");
    ArtifactSpec {
        name: "appengine".to_string(),
        source: "https://storage.googleapis.com/appengine-sdks/featured/go_appengine_sdk_linux_amd64-1.9.27.zip"
            .to_string(),
        name_hint: "appengine.zip".to_string(),
        root_dir: "go_appengine".to_string(),
        probe: Probe::Version(VersionProbe::exact(
            destination.join("goapp"),
            &["version"],
            "go version go1.4.2 (appengine-1.9.27) linux/amd64",
        )),
        destination,
        hook: None,
    }
}

/// Redis server, built and installed into the home prefix.
#[must_use]
pub fn redis(config: &Config) -> ArtifactSpec {
    ArtifactSpec {
        name: "redis".to_string(),
        source: "http://download.redis.io/releases/redis-3.0.4.tar.gz".to_string(),
        name_hint: "redis.tar.gz".to_string(),
        root_dir: "redis-3.0.4".to_string(),
        destination: config.dist("redis"),
        probe: Probe::Version(VersionProbe::exact(
            config.bin_dir.join("redis-server"),
            &["--version"],
            "Redis server v=3.0.4 sha=00000000:0 malloc=jemalloc-3.6.0 bits=64 build=bbb5a106838ae534",
        )),
        hook: Some(
            PostInstallHook::new(["make", "make install"]).with_env("PREFIX", lossy(&config.home)),
        ),
    }
}

/// Apache ZooKeeper.
#[must_use]
pub fn zookeeper(config: &Config) -> ArtifactSpec {
    let destination = config.dist("zookeeper");
    ArtifactSpec {
        name: "zookeeper".to_string(),
        source: "http://mirrors.sonic.net/apache/zookeeper/zookeeper-3.4.6/zookeeper-3.4.6.tar.gz"
            .to_string(),
        name_hint: "zookeeper.tar.gz".to_string(),
        root_dir: "zookeeper-3.4.6".to_string(),
        probe: Probe::Marker {
            path: destination.join("zookeeper-3.4.6.jar"),
        },
        destination,
        hook: None,
    }
}

/// Apache Kafka.
#[must_use]
pub fn kafka(config: &Config) -> ArtifactSpec {
    let destination = config.dist("kafka");
    ArtifactSpec {
        name: "kafka".to_string(),
        source: "http://mirrors.sonic.net/apache/kafka/0.8.2.1/kafka_2.10-0.8.2.1.tgz".to_string(),
        name_hint: "kafka.tgz".to_string(),
        root_dir: "kafka_2.10-0.8.2.1".to_string(),
        probe: Probe::Marker {
            path: destination.join("libs/kafka_2.10-0.8.2.1.jar"),
        },
        destination,
        hook: None,
    }
}

/// Apache Cassandra.
#[must_use]
pub fn cassandra(config: &Config) -> ArtifactSpec {
    let destination = config.dist("cassandra");
    ArtifactSpec {
        name: "cassandra".to_string(),
        source: "http://mirrors.sonic.net/apache/cassandra/2.2.1/apache-cassandra-2.2.1-bin.tar.gz"
            .to_string(),
        name_hint: "cassandra.tar.gz".to_string(),
        root_dir: "apache-cassandra-2.2.1".to_string(),
        probe: Probe::Marker {
            path: destination.join("lib/apache-cassandra-2.2.1.jar"),
        },
        destination,
        hook: None,
    }
}

/// Elasticsearch.
#[must_use]
pub fn elasticsearch(config: &Config) -> ArtifactSpec {
    let destination = config.dist("elasticsearch");
    ArtifactSpec {
        name: "elasticsearch".to_string(),
        source: "https://download.elastic.co/elasticsearch/elasticsearch/elasticsearch-1.7.2.tar.gz"
            .to_string(),
        name_hint: "elasticsearch.tar.gz".to_string(),
        root_dir: "elasticsearch-1.7.2".to_string(),
        probe: Probe::Marker {
            path: destination.join("lib/elasticsearch-1.7.2.jar"),
        },
        destination,
        hook: None,
    }
}

/// HAProxy, built in place and allowed to bind privileged ports.
///
/// `haproxy -v` appends the release date and copyright, so the probe only
/// matches the leading version line.
#[must_use]
pub fn haproxy(config: &Config) -> ArtifactSpec {
    let destination = config.dist("haproxy");
    ArtifactSpec {
        name: "haproxy".to_string(),
        source: "http://www.haproxy.org/download/1.6/src/haproxy-1.6.1.tar.gz".to_string(),
        name_hint: "haproxy.tar.gz".to_string(),
        root_dir: "haproxy-1.6.1".to_string(),
        probe: Probe::Version(
            VersionProbe::exact(destination.join("haproxy"), &["-v"], "HA-Proxy version 1.6.1")
                .prefix(),
        ),
        destination,
        hook: Some(PostInstallHook::new([
            "make TARGET=linux2628",
            "sudo setcap 'cap_net_bind_service=+ep' haproxy",
        ])),
    }
}
