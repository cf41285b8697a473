use cucumber::World;
use cucumber_tests::features::world::PdfdeskWorld;

#[tokio::main]
async fn main() {
    // Every scenario runs against the scripted in-memory backend
    PdfdeskWorld::cucumber().run_and_exit("features/").await;
}
