use std::borrow::Cow;

use hanoi::{CallContext, Extractor, Feature, MemoryBackEnd, Rollout, Subject};

struct Foo {
    id: String,
}

impl Subject for Foo {
    fn subject_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        (name == "id").then(|| self.id.clone())
    }
}

fn my_test(foo: &Foo) {
    println!("I'm in, {}", foo.id);
}

pub fn main() {
    env_logger::init();

    let mut rollout = Rollout::new(MemoryBackEnd::new());
    rollout
        .add_func(
            Feature::new("cdc_on")
                .unwrap()
                .with_field(Extractor::new(|subject| subject.attribute("id"))),
        )
        .unwrap();

    let foo = Foo { id: "foo".into() };
    rollout.register("cdc_on", &foo).unwrap();

    // Only runs for subjects the feature is active for; the subject is the first argument.
    let guard = rollout.check("cdc_on", Some(0));
    for foo in [foo, Foo { id: "foo1".into() }] {
        let args: [&dyn Subject; 1] = [&foo];
        match guard.call(&mut rollout, &CallContext::new(), &args, || my_test(&foo)) {
            Ok(()) => {}
            Err(err) => println!("Skipped {}: {err}", foo.id),
        }
    }

    let is_cdc_on = rollout.accessor("is_cdc_on").unwrap();
    println!("{}", is_cdc_on.is_enabled(&mut rollout, &Foo { id: "foo".into() }).unwrap());
    println!("{}", is_cdc_on.is_enabled(&mut rollout, &Foo { id: "foo1".into() }).unwrap());

    // No such feature.
    if let Err(err) = rollout.accessor("is_cdc_o") {
        println!("{err}");
    }
}
